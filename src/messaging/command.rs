// Control messages - UI → scheduler worker

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// IDLE → PLAYING, beats queued for display carry `session`
    Start { session: u32 },
    /// PLAYING → IDLE, the session reset follows after the grace delay
    Stop,
    /// Next scheduled beat becomes the downbeat (beats per measure changed)
    RestartMeasure,
    Quit,
}
