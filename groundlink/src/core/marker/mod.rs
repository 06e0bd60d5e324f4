//! # Generic markers
//!
//! These markers are used to track which required settings of a builder are already set.

use std::fmt::Debug;
use std::sync::Arc;

use crate::core::scheduler::Scheduler;
use crate::core::utils::Sealed;

/// <sup>🔒</sup>
/// Marker for a builder with or without scheduler.
///
/// ⚠ This trait is sealed ⚠
///
/// Variants:
///
/// * [`Unset`]
/// * [`HasScheduler`]
pub trait MaybeScheduler: Clone + Debug + Sealed {}

/// Required setting is not set yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unset;
impl Sealed for Unset {}
impl MaybeScheduler for Unset {}

/// Builder with a scheduler.
#[derive(Clone, Debug)]
pub struct HasScheduler(pub(crate) Arc<dyn Scheduler>);
impl Sealed for HasScheduler {}
impl MaybeScheduler for HasScheduler {}
