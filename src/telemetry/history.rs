//! Bounded pressure history for plotting consumers.

use std::collections::VecDeque;

/// Most recent pressure samples, oldest first
#[derive(Debug, Clone)]
pub struct PressureHistory {
    points: VecDeque<i32>,
    capacity: usize,
}

impl PressureHistory {
    /// Capacity of zero is treated as one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: i32) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(value);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.iter().copied()
    }

    /// Points mapped onto `[0, 1]` for a plot axis spanning `min..=max`
    ///
    /// Values outside the axis are clamped here, at the display layer; the
    /// stored samples are untouched.
    pub fn normalized(&self, min: i32, max: i32) -> Vec<f32> {
        self.iter().map(|v| plot_fraction(v, min, max)).collect()
    }
}

/// Position of `value` on an axis spanning `min..=max`, clamped to `[0, 1]`
pub fn plot_fraction(value: i32, min: i32, max: i32) -> f32 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let span = (i64::from(hi) - i64::from(lo)).max(1) as f32;
    let clamped = value.clamp(lo, hi);
    (i64::from(clamped) - i64::from(lo)) as f32 / span
}
