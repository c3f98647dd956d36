//! Command parsing and execution
//!
//! One command per line: a verb followed by whitespace-separated arguments.
//! Arguments containing spaces are written in double quotes, with `\"` and
//! `\\` as escapes. Enumerations accept their snake_case name or raw value.

use audiopolicy_core::{
    ActiveDeviceType, AsyncAudioManager, AudioScene, DeviceDescriptor, DeviceFlag, DeviceRole,
    DeviceType, PolicyError, RingerMode, StreamCategory,
};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command}: missing argument <{argument}>")]
    MissingArgument {
        command: String,
        argument: &'static str,
    },

    #[error("{0}: too many arguments")]
    TooManyArguments(String),

    #[error("Invalid {argument} '{value}': {reason}")]
    InvalidArgument {
        argument: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unterminated quote")]
    UnterminatedQuote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetVolume(StreamCategory, i32),
    GetVolume(StreamCategory),
    GetMinVolume(StreamCategory),
    GetMaxVolume(StreamCategory),
    VolumeUp(StreamCategory),
    VolumeDown(StreamCategory),
    Mute(StreamCategory, bool),
    IsMute(StreamCategory),
    IsActive(StreamCategory),
    GetDevices(DeviceFlag),
    SetDeviceActive(ActiveDeviceType, bool),
    IsDeviceActive(ActiveDeviceType),
    ConnectDevice(DeviceDescriptor),
    DisconnectDevice(DeviceDescriptor),
    SetRingerMode(RingerMode),
    GetRingerMode,
    SetParameter(String, String),
    GetParameter(String),
    SetMicMute(bool),
    IsMicMute,
    SetScene(AudioScene),
    GetScene,
    Quit,
}

/// One line of output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(value: Option<Value>) -> Self {
        Self {
            ok: true,
            value,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            value: None,
            error: Some(message.into()),
        }
    }

    fn from_result<T: Serialize>(result: Result<T, PolicyError>) -> Self {
        match result {
            Ok(value) => match serde_json::to_value(value) {
                Ok(Value::Null) => Self::ok(None),
                Ok(value) => Self::ok(Some(value)),
                Err(err) => Self::error(err.to_string()),
            },
            Err(err) => Self::error(err.to_string()),
        }
    }

    pub fn to_line(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|err| format!("{{\"ok\":false,\"error\":\"{}\"}}", err))
    }
}

/// Split a line into arguments, honouring double quotes
fn tokenize(line: &str) -> Result<Vec<String>, CommandError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some(escaped) => token.push(escaped),
                        None => return Err(CommandError::UnterminatedQuote),
                    },
                    _ => token.push(c),
                }
            }
            if !closed {
                return Err(CommandError::UnterminatedQuote);
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

/// Positional argument reader for one command
struct Args<'a> {
    command: &'a str,
    rest: std::slice::Iter<'a, String>,
}

impl<'a> Args<'a> {
    fn next(&mut self, argument: &'static str) -> Result<&'a str, CommandError> {
        self.rest
            .next()
            .map(String::as_str)
            .ok_or_else(|| CommandError::MissingArgument {
                command: self.command.to_string(),
                argument,
            })
    }

    fn parse<T>(&mut self, argument: &'static str) -> Result<T, CommandError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.next(argument)?;
        value.parse().map_err(|err: T::Err| CommandError::InvalidArgument {
            argument,
            value: value.to_string(),
            reason: err.to_string(),
        })
    }

    fn flag(&mut self, argument: &'static str) -> Result<bool, CommandError> {
        let value = self.next(argument)?;
        match value.to_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(true),
            "false" | "off" | "no" | "0" => Ok(false),
            _ => Err(CommandError::InvalidArgument {
                argument,
                value: value.to_string(),
                reason: "expected true or false".into(),
            }),
        }
    }

    fn descriptor(&mut self) -> Result<DeviceDescriptor, CommandError> {
        let role: DeviceRole = self.parse("role")?;
        let device_type: DeviceType = self.parse("device")?;
        Ok(DeviceDescriptor::new(role, device_type))
    }

    fn finish<T>(mut self, command: T) -> Result<T, CommandError> {
        match self.rest.next() {
            Some(_) => Err(CommandError::TooManyArguments(self.command.to_string())),
            None => Ok(command),
        }
    }
}

impl Command {
    /// Parse one input line
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let tokens = tokenize(line)?;
        let Some((verb, rest)) = tokens.split_first() else {
            return Err(CommandError::Empty);
        };

        let mut args = Args {
            command: verb,
            rest: rest.iter(),
        };

        let parsed = match verb.as_str() {
            "set-volume" => {
                let category = args.parse("category")?;
                Command::SetVolume(category, args.parse("volume")?)
            }
            "get-volume" => Command::GetVolume(args.parse("category")?),
            "get-min-volume" => Command::GetMinVolume(args.parse("category")?),
            "get-max-volume" => Command::GetMaxVolume(args.parse("category")?),
            "volume-up" => Command::VolumeUp(args.parse("category")?),
            "volume-down" => Command::VolumeDown(args.parse("category")?),
            "mute" => {
                let category = args.parse("category")?;
                Command::Mute(category, args.flag("muted")?)
            }
            "is-mute" => Command::IsMute(args.parse("category")?),
            "is-active" => Command::IsActive(args.parse("category")?),
            "get-devices" => Command::GetDevices(args.parse("flag")?),
            "set-device-active" => {
                let device = args.parse("device")?;
                Command::SetDeviceActive(device, args.flag("active")?)
            }
            "is-device-active" => Command::IsDeviceActive(args.parse("device")?),
            "connect-device" => Command::ConnectDevice(args.descriptor()?),
            "disconnect-device" => Command::DisconnectDevice(args.descriptor()?),
            "set-ringer-mode" => Command::SetRingerMode(args.parse("mode")?),
            "get-ringer-mode" => Command::GetRingerMode,
            "set-parameter" => {
                let key = args.next("key")?.to_string();
                Command::SetParameter(key, args.next("value")?.to_string())
            }
            "get-parameter" => Command::GetParameter(args.next("key")?.to_string()),
            "set-mic-mute" => Command::SetMicMute(args.flag("muted")?),
            "is-mic-mute" => Command::IsMicMute,
            "set-scene" => Command::SetScene(args.parse("scene")?),
            "get-scene" => Command::GetScene,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };

        args.finish(parsed)
    }
}

/// Run a command against the policy
pub async fn execute(api: &AsyncAudioManager, command: Command) -> Response {
    match command {
        Command::SetVolume(category, volume) => {
            Response::from_result(api.set_volume(category, volume).await)
        }
        Command::GetVolume(category) => Response::from_result(api.get_volume(category).await),
        Command::GetMinVolume(category) => {
            Response::from_result(api.get_min_volume(category).await)
        }
        Command::GetMaxVolume(category) => {
            Response::from_result(api.get_max_volume(category).await)
        }
        Command::VolumeUp(category) => Response::from_result(api.volume_up(category).await),
        Command::VolumeDown(category) => Response::from_result(api.volume_down(category).await),
        Command::Mute(category, muted) => Response::from_result(api.mute(category, muted).await),
        Command::IsMute(category) => Response::from_result(api.is_mute(category).await),
        Command::IsActive(category) => Response::from_result(api.is_active(category).await),
        Command::GetDevices(flag) => Response::from_result(api.get_devices(flag).await),
        Command::SetDeviceActive(device, active) => {
            Response::from_result(api.set_device_active(device, active).await)
        }
        Command::IsDeviceActive(device) => {
            Response::from_result(api.is_device_active(device).await)
        }
        Command::ConnectDevice(descriptor) => {
            Response::from_result(api.connect_device(descriptor).await)
        }
        Command::DisconnectDevice(descriptor) => {
            Response::from_result(api.disconnect_device(descriptor).await)
        }
        Command::SetRingerMode(mode) => Response::from_result(api.set_ringer_mode(mode).await),
        Command::GetRingerMode => Response::from_result(api.get_ringer_mode().await),
        Command::SetParameter(key, value) => {
            Response::from_result(api.set_audio_parameter(&key, &value).await)
        }
        Command::GetParameter(key) => Response::from_result(api.get_audio_parameter(&key).await),
        Command::SetMicMute(muted) => Response::from_result(api.set_microphone_mute(muted).await),
        Command::IsMicMute => Response::from_result(api.is_microphone_mute().await),
        Command::SetScene(scene) => Response::from_result(api.set_audio_scene(scene).await),
        Command::GetScene => Response::from_result(api.get_audio_scene().await),
        Command::Quit => Response::ok(None),
    }
}
