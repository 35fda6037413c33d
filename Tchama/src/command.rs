//! Commandes saisies sur la console

use anyhow::{Result, anyhow, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(String),
    Pause,
    Resume,
    Skip,
    Leave,
    List,
    Remove(String),
    Clear,
    Shuffle,
    Lyrics(Option<String>),
    Ping,
    Help,
    Quit,
}

pub const HELP: &str = "\
play|p <text or link>   enqueue a song, a link or a playlist
pause|ps                pause playback
resume|rs               resume playback
next|n|s|skip           skip the current song
leave|l                 clear the queue and disconnect
list|ls|q|queue         show the queue
remove|r <index>        remove a queued song
clear|c                 empty the queue
shuffle|sf              shuffle the queue
lyrics|ly [text]        lyrics of the current song, or of <text>
ping                    pong
quit|exit               stop Tchama";

impl Command {
    /// Analyse une ligne ; `Ok(None)` pour une ligne vide
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let argument = (!rest.is_empty()).then(|| rest.to_string());

        let command = match name.to_lowercase().as_str() {
            "play" | "p" => {
                Command::Play(argument.ok_or_else(|| anyhow!("usage: play <text or link>"))?)
            }
            "pause" | "ps" => Command::Pause,
            "resume" | "rs" => Command::Resume,
            "next" | "n" | "s" | "skip" => Command::Skip,
            "leave" | "l" => Command::Leave,
            "list" | "ls" | "q" | "queue" => Command::List,
            "remove" | "r" => {
                Command::Remove(argument.ok_or_else(|| anyhow!("usage: remove <index>"))?)
            }
            "clear" | "c" => Command::Clear,
            "shuffle" | "sf" => Command::Shuffle,
            "lyrics" | "ly" => Command::Lyrics(argument),
            "ping" => Command::Ping,
            "help" | "h" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{other}`, type `help`"),
        };
        Ok(Some(command))
    }
}
