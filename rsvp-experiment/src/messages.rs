//! Participant-facing instruction screens.

use rsvp_core::{Dimension, Eye};

pub const WELCOME: &str = "Welcome to the experiment!\n\nPress SPACE or ENTER to continue.";

pub const PRACTICE: &str = "Practice Run\n\nPress SPACE or ENTER to begin.";

pub const NEXT_TRIAL: &str = "Press SPACE to start the next trial.";

pub const GOODBYE: &str = "Thank you for participating!\n\nThe experiment is now complete.";

pub fn adaptive_instructions() -> &'static str {
    "Instructions:\n\n\
     You will see a rapid stream of items in the center of the screen.\n\
     Each stream contains numbers and ONE letter.\n\
     Your task is to identify the LETTER.\n\n\
     The experiment will adapt to your performance.\n\
     First, the size of the letters will change, then their contrast.\n\n\
     First, there will be a short practice.\n\n\
     Press SPACE or ENTER to start the practice."
}

pub fn sweep_instructions(detection: bool) -> &'static str {
    if detection {
        "Instructions:\n\n\
         You will see a rapid stream of numbers in the center of the screen.\n\
         Some streams contain a letter.\n\
         After each stream, press Y if you saw a letter and N if you did not.\n\n\
         Press SPACE or ENTER to start the practice."
    } else {
        "Instructions:\n\n\
         You will see a rapid stream of items in the center of the screen.\n\
         Each stream contains numbers and ONE letter.\n\
         Your task is to identify the LETTER.\n\n\
         Press SPACE or ENTER to start the practice."
    }
}

/// Screen shown before a staircase phase.
pub fn staircase_phase(eye: Eye, dimension: Dimension) -> String {
    let covered = eye.fellow().as_str().to_uppercase();
    match dimension {
        Dimension::Size => format!(
            "{} Eye - Size Adjustment Phase\n\n\
             Please cover your {covered} eye now.\n\n\
             You will need to identify the letter in each trial.\n\n\
             Press SPACE or ENTER to begin.",
            title(eye)
        ),
        Dimension::Contrast => format!(
            "{} Eye - Contrast Adjustment Phase\n\n\
             Keep your {covered} eye covered.\n\n\
             The size will stay fixed, but the contrast will change.\n\n\
             Press SPACE or ENTER to begin.",
            title(eye)
        ),
    }
}

/// Screen shown before a fixed-level block.
pub fn sweep_block(eye: Eye, passive: bool) -> String {
    let covered = eye.fellow().as_str().to_uppercase();
    if passive {
        format!(
            "{} Eye - Watching Block\n\n\
             Keep your {covered} eye covered.\n\n\
             Just watch the streams, no response is needed.\n\n\
             Press SPACE or ENTER to begin.",
            title(eye)
        )
    } else {
        format!(
            "{} Eye\n\n\
             Please cover your {covered} eye now.\n\n\
             Press SPACE or ENTER to begin.",
            title(eye)
        )
    }
}

pub fn switch_eye(from: Eye) -> String {
    format!(
        "{} Eye Testing Complete\n\n\
         Now we'll switch to your {} eye.\n\n\
         Please take a short break if needed.\n\n\
         Press SPACE or ENTER when you're ready to continue.",
        title(from),
        from.fellow().as_str().to_uppercase()
    )
}

fn title(eye: Eye) -> &'static str {
    match eye {
        Eye::Left => "Left",
        Eye::Right => "Right",
    }
}
