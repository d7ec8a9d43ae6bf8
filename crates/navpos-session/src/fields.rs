// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Canonical trial-table field names.

/// Outcome code from the task controller; 0 is correct, 6 is completed-but-wrong
pub const TRIAL_ERROR: &str = "TrialError";

pub const SPIKE_TIMES: &str = "spikeTimes";
pub const NEURON_REGIONS: &str = "neur_regions";

pub const COMPLETED_TRIAL: &str = "completed_trial";
pub const CORRECT_TRIAL: &str = "correct_trial";

pub const IS_EAST: &str = "IsEast";
pub const IS_INSTRUCTED: &str = "IsInstructed";
pub const TARGET_RIGHT: &str = "target_right";
pub const WHITE_RIGHT: &str = "white_right";

pub const POST_ROTATION_END: &str = "post_rotation_end";
pub const APPROACH_START: &str = "approach_start";

pub const ROTATION_TRACE: &str = "rotation_tc";
pub const PRE_CHOICE_ROTATION: &str = "pre_choice_rotation";
pub const CHOICE_ROTATION: &str = "choice_rotation";

pub const POS_X: &str = "pos_x";
pub const POS_Y: &str = "pos_y";

pub const BORDER_CROSSING_X: &str = "border_crossing_x";
pub const BORDER_CROSSING_X_DIR: &str = "border_crossing_x_dir";
pub const BORDER_CROSSING_Y: &str = "border_crossing_y";
pub const BORDER_CROSSING_Y_DIR: &str = "border_crossing_y_dir";
pub const RELEVANT_CROSSING_X: &str = "relevant_crossing_x";
pub const RELEVANT_CROSSING_Y: &str = "relevant_crossing_y";

/// Outcome codes that count as a completed trial
pub const COMPLETED_CODES: [f64; 2] = [0.0, 6.0];
pub const CORRECT_CODE: f64 = 0.0;
