//! Amiga period to note number conversion

/// Amiga periods for the five ProTracker octaves, C-0 upwards
pub const PERIODS: [u16; 60] = [
    1712, 1616, 1525, 1440, 1357, 1281, 1209, 1141, 1077, 1017, 961, 907, //
    856, 808, 762, 720, 678, 640, 604, 570, 538, 508, 480, 453, //
    428, 404, 381, 360, 339, 320, 302, 285, 269, 254, 240, 226, //
    214, 202, 190, 180, 170, 160, 151, 143, 135, 127, 120, 113, //
    107, 101, 95, 90, 85, 80, 76, 71, 67, 64, 60, 57,
];

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// Look up the note number for an exact period value
pub fn period_to_note(period: u16) -> Option<u8> {
    PERIODS.iter().position(|&p| p == period).map(|n| n as u8)
}

/// Period value for a note number
pub fn note_to_period(note: u8) -> Option<u16> {
    PERIODS.get(note as usize).copied()
}

/// Tracker-style note name, e.g. "F-2"
pub fn note_name(note: u8) -> String {
    format!("{}{}", NOTE_NAMES[note as usize % 12], note / 12)
}
