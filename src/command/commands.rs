// Concrete command handlers

use crate::DeviceId;
use crate::clock::Clock;
use crate::command::trait_def::Reply;
use crate::sequencer::{LoopMode, SequencerError, SequencerResult};
use crate::stage::Stage;

fn malformed(command: &str, reason: impl Into<String>) -> SequencerError {
    SequencerError::MalformedPayload {
        command: command.to_string(),
        reason: reason.into(),
    }
}

fn parse_device(command: &str, payload: &str) -> SequencerResult<DeviceId> {
    payload
        .trim()
        .parse::<u32>()
        .map(DeviceId::new)
        .map_err(|_| malformed(command, format!("'{}' is not a device id", payload.trim())))
}

pub fn play<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    _payload: &str,
) -> SequencerResult<Reply> {
    stage.play(device)?;
    Ok(Reply::ok())
}

pub fn stop<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    _payload: &str,
) -> SequencerResult<Reply> {
    stage.stop(device)?;
    Ok(Reply::ok())
}

/// Replies with a summary of the new schedule; an empty one is reported as not playable
pub fn set_notes<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    payload: &str,
) -> SequencerResult<Reply> {
    stage.set_notes(device, payload)?;
    let sequencer = stage.device(device)?;
    let schedule = sequencer.schedule();
    let errors = sequencer.error_log().len();

    if schedule.is_empty() {
        return Ok(Reply::message(format!("0 notes, {} errors: not playable", errors)));
    }
    Ok(Reply::message(format!(
        "{} notes ({} sounding, {:.3} s), {} errors",
        schedule.len(),
        schedule.sounding_count(),
        schedule.duration(sequencer.timing()),
        errors
    )))
}

pub fn set_timing<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    payload: &str,
) -> SequencerResult<Reply> {
    stage.set_timing_text(device, payload)?;
    Ok(Reply::message(stage.device(device)?.timing().to_string()))
}

pub fn set_instrument<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    payload: &str,
) -> SequencerResult<Reply> {
    stage.set_instrument(device, payload)?;
    Ok(Reply::ok())
}

/// Payload: empty or `soft` for a soft reset, `hard` for a hard one
pub fn reset<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    payload: &str,
) -> SequencerResult<Reply> {
    let hard = match payload.trim().to_ascii_lowercase().as_str() {
        "" | "soft" => false,
        "hard" => true,
        other => {
            return Err(malformed(
                "reset",
                format!("expected 'hard' or 'soft', got '{}'", other),
            ));
        }
    };
    stage.reset(device, hard)?;
    Ok(Reply::ok())
}

pub fn view_errors<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    _payload: &str,
) -> SequencerResult<Reply> {
    Ok(Reply::message(stage.view_errors(device)?))
}

pub fn toggle_loop<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    _payload: &str,
) -> SequencerResult<Reply> {
    let message = match stage.toggle_loop(device)? {
        LoopMode::On => "loop on",
        LoopMode::Off => "loop off",
        LoopMode::Locked => "loop locked",
    };
    Ok(Reply::message(message))
}

pub fn lock_loop<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    _payload: &str,
) -> SequencerResult<Reply> {
    stage.lock_loop(device)?;
    Ok(Reply::message("loop locked"))
}

/// Payload: the peer's device id
pub fn link<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    payload: &str,
) -> SequencerResult<Reply> {
    let peer = parse_device("link", payload)?;
    stage.link(device, peer)?;
    Ok(Reply::ok())
}

pub fn unlink<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    _payload: &str,
) -> SequencerResult<Reply> {
    stage.unlink(device)?;
    Ok(Reply::ok())
}

pub fn autolink<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    _payload: &str,
) -> SequencerResult<Reply> {
    stage.arm_autolink(device)?;
    Ok(Reply::ok())
}

/// Payload: the target's device id
pub fn pair<C: Clock>(
    stage: &mut Stage<C>,
    device: DeviceId,
    payload: &str,
) -> SequencerResult<Reply> {
    let target = parse_device("pair", payload)?;
    stage.pair(device, target)?;
    Ok(Reply::ok())
}
