use std::ops::{Index, IndexMut};

use chrono::{DateTime, TimeZone};
use enumset::EnumSet;
use serde::Serialize;

use crate::{
    engine::period::PeriodKind,
    prelude::*,
    quantity::{cost::Cost, energy::KilowattHours},
};

#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, derive_more::AddAssign)]
pub struct Totals {
    #[serde(rename = "energy_kwh")]
    pub energy: KilowattHours,

    pub cost: Cost,
}

impl Totals {
    pub const ZERO: Self = Self { energy: KilowattHours::ZERO, cost: Cost::ZERO };
}

/// Running totals of the current instance of a period.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodAccumulator<Tz: TimeZone> {
    pub totals: Totals,

    /// Anchor of the period instance the totals belong to.
    pub start: DateTime<Tz>,
}

impl<Tz: TimeZone> PeriodAccumulator<Tz> {
    pub fn new(start: DateTime<Tz>) -> Self {
        Self { totals: Totals::ZERO, start }
    }

    /// Reset the totals if `now` belongs to a later period instance.
    ///
    /// Returns the totals from before the reset.
    pub fn roll_over(&mut self, kind: PeriodKind, now: &DateTime<Tz>) -> Option<Totals> {
        let anchor = kind.anchor(now);
        if anchor <= self.start {
            return None;
        }
        let previous = std::mem::replace(&mut self.totals, Totals::ZERO);
        if kind == PeriodKind::Hour {
            debug!(%kind, energy = ?previous.energy, cost = ?previous.cost, "period reset");
        } else {
            info!(%kind, energy = ?previous.energy, cost = ?previous.cost, "period reset");
        }
        self.start = anchor;
        Some(previous)
    }
}

/// Accumulators for every period kind.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Periods<Tz: TimeZone>([PeriodAccumulator<Tz>; 5]);

impl<Tz: TimeZone> Periods<Tz> {
    /// Zero totals anchored at the periods containing `now`.
    pub fn starting_at(now: &DateTime<Tz>) -> Self {
        Self(PeriodKind::ALL.map(|kind| PeriodAccumulator::new(kind.anchor(now))))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PeriodKind, &PeriodAccumulator<Tz>)> {
        PeriodKind::ALL.into_iter().zip(&self.0)
    }

    /// Roll over every period whose boundary has been crossed,
    /// and return the kinds that rolled over along with their final totals.
    pub fn roll_over(&mut self, now: &DateTime<Tz>) -> Vec<(PeriodKind, Totals)> {
        PeriodKind::ALL
            .into_iter()
            .filter_map(|kind| self[kind].roll_over(kind, now).map(|totals| (kind, totals)))
            .collect()
    }

    pub fn add(&mut self, delta: Totals) {
        for accumulator in &mut self.0 {
            accumulator.totals += delta;
        }
    }

    pub fn totals(&self, kind: PeriodKind) -> Totals {
        self[kind].totals
    }
}

impl<Tz: TimeZone> Index<PeriodKind> for Periods<Tz> {
    type Output = PeriodAccumulator<Tz>;

    fn index(&self, kind: PeriodKind) -> &Self::Output {
        &self.0[kind.index()]
    }
}

impl<Tz: TimeZone> IndexMut<PeriodKind> for Periods<Tz> {
    fn index_mut(&mut self, kind: PeriodKind) -> &mut Self::Output {
        &mut self.0[kind.index()]
    }
}

/// Collect the rolled-over kinds for the snapshot.
pub fn kinds(rolled_over: &[(PeriodKind, Totals)]) -> EnumSet<PeriodKind> {
    rolled_over.iter().map(|(kind, _)| *kind).collect()
}
