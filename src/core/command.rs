//! Inbound command vocabulary
//!
//! Commands arrive as short ASCII writes on the characteristic. Parsing is
//! case-insensitive and whitespace-trimmed. Anything that does not parse is
//! reported to the dispatcher as unrecognized (logged, never surfaced to
//! the peer).

/// Parsed controller command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `MTU:<n>` - negotiate the transport chunk size from a declared MTU
    NegotiateMtu(u16),
    /// `IMAGE` - one-shot capture and transfer
    Image,
    /// `AUDIO_START` - begin continuous microphone streaming
    AudioStart,
    /// `AUDIO_STOP` - request cooperative stop of the audio stream
    AudioStop,
    /// `VQA_START` - begin the composite audio-then-image workflow
    VqaStart,
    /// `VQA_STOP` - end the audio phase of the VQA workflow
    VqaStop,
}

impl Command {
    /// Parse a raw characteristic write
    ///
    /// Returns `None` for unrecognized input (including malformed or
    /// non-numeric MTU values; range checking happens at negotiation).
    pub fn parse(raw: &str) -> Option<Command> {
        let cmd = raw.trim().to_ascii_uppercase();

        if let Some(arg) = cmd.strip_prefix("MTU:") {
            return arg.trim().parse::<u16>().ok().map(Command::NegotiateMtu);
        }

        match cmd.as_str() {
            "IMAGE" => Some(Command::Image),
            "AUDIO_START" => Some(Command::AudioStart),
            "AUDIO_STOP" => Some(Command::AudioStop),
            "VQA_START" => Some(Command::VqaStart),
            "VQA_STOP" => Some(Command::VqaStop),
            _ => None,
        }
    }
}
