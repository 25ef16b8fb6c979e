#![forbid(unsafe_code)]

use crate::Error;
use slots::{PrefetchRequest, SlotKey};
use std::{str::FromStr, time::Duration};

pub const HELP: &str = "\
commands:
  start <url> [Name:value]...   start a prefetch, prints its key
  cancel <key>                  cancel a prefetch
  config <ttl-secs> <max>       update settings, non-positive values are ignored
  ttl <secs>                    set the time-to-live as given
  max <n>                       set the slot capacity as given (capped at 20)
  list                          print the slot table
  wait <millis>                 stop reading commands for a while
  help                          print this help
  quit                          exit

at end of input the pending prefetches are waited for and reported;
quit exits at once and cancels them.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(PrefetchRequest),
    Cancel(SlotKey),
    Configure { ttl_secs: i32, max_slots: i32 },
    SetTtl(i32),
    SetMaxSlots(i32),
    List,
    Wait(Duration),
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    pub fn parse_line(line: &str) -> Result<Option<Self>, Error> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        line.parse().map(Some)
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::InvalidCommand {
            line: line.to_owned(),
            reason: reason.to_owned(),
        };
        let int = |word: Option<&str>, what: &str| -> Result<i32, Error> {
            word.ok_or_else(|| invalid(&format!("missing {what}")))?
                .parse()
                .map_err(|_| invalid(&format!("{what} must be an integer")))
        };

        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(invalid("empty command"));
        };
        let command = match verb {
            "start" => {
                let url = words.next().ok_or_else(|| invalid("missing url"))?;
                let mut request = PrefetchRequest::new(url);
                for header in words.by_ref() {
                    let (name, value) = header
                        .split_once(':')
                        .ok_or_else(|| invalid("headers are written Name:value"))?;
                    request = request.with_header(name, value);
                }
                Command::Start(request)
            }
            "cancel" => Command::Cancel(SlotKey::new(int(words.next(), "key")?)),
            "config" => Command::Configure {
                ttl_secs: int(words.next(), "ttl")?,
                max_slots: int(words.next(), "max")?,
            },
            "ttl" => Command::SetTtl(int(words.next(), "ttl")?),
            "max" => Command::SetMaxSlots(int(words.next(), "max")?),
            "list" => Command::List,
            "wait" => {
                let millis = int(words.next(), "millis")?;
                let millis = u64::try_from(millis).map_err(|_| invalid("millis must not be negative"))?;
                Command::Wait(Duration::from_millis(millis))
            }
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(invalid("unknown command, try `help`")),
        };
        if words.next().is_some() {
            return Err(invalid("too many arguments"));
        }
        Ok(command)
    }
}
