//! Reusable oracles.

use crate::scenario::{OracleFn, World};

/// Every transition finished and nothing is queued.
pub fn settled() -> OracleFn {
    Box::new(|world: &World| {
        if world.is_settled() {
            Ok(())
        } else {
            Err(format!("world not settled: {:?}", world.controller()))
        }
    })
}

/// The current location is `view`.
pub fn current_location(view: impl Into<String>) -> OracleFn {
    let view = view.into();
    Box::new(move |world: &World| match world.current_view() {
        Some(current) if current == view.as_str() => Ok(()),
        other => Err(format!("expected current location {view}, got {other:?}")),
    })
}

/// The previous location is `view`.
pub fn last_location(view: impl Into<String>) -> OracleFn {
    let view = view.into();
    Box::new(move |world: &World| match world.controller().last_location() {
        Some(last) if *last == view.as_str() => Ok(()),
        other => Err(format!("expected last location {view}, got {other:?}")),
    })
}

/// The open overlays are exactly `views`, oldest first.
pub fn overlays(views: &[&str]) -> OracleFn {
    let expected: Vec<String> = views.iter().map(|view| (*view).to_string()).collect();
    Box::new(move |world: &World| {
        let actual: Vec<String> =
            world.overlay_views().iter().map(ToString::to_string).collect();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected overlays {expected:?}, got {actual:?}"))
        }
    })
}

/// Every registered view holds exactly one reference per live instance.
pub fn balanced_references() -> OracleFn {
    Box::new(|world: &World| {
        for registration in &world.controller().config().views {
            let view = registration.id.as_str();
            let refs = world.controller().ref_count(view) as usize;
            let live = world.live_count(view);
            if refs != live {
                return Err(format!("{view}: {refs} references for {live} live instances"));
            }
        }
        Ok(())
    })
}

/// All of `oracles` must pass; the first failure is reported.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world: &World| {
        for oracle in &oracles {
            oracle(world)?;
        }
        Ok(())
    })
}
