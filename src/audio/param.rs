// A bounded, steppable knob. Voices keep a fixed array of these indexed by
// their parameter-id enum; the UI only ever nudges them by whole steps.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Parameter {
    label: &'static str,
    unit: &'static str,
    min: f32,
    max: f32,
    default: f32,
    step: f32,
    value: f32,
    options: &'static [&'static str], // non-empty for selector params
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            label: "",
            unit: "",
            min: 0.0,
            max: 1.0,
            default: 0.0,
            step: 0.0,
            value: 0.0,
            options: &[],
        }
    }
}

impl Parameter {
    pub fn new(
        label: &'static str,
        unit: &'static str,
        min: f32,
        max: f32,
        default: f32,
        step: f32,
    ) -> Self {
        let mut p = Self {
            label,
            unit,
            min,
            max,
            default,
            step,
            value: default,
            options: &[],
        };
        // keep the invariant even if the table entry is off
        p.default = p.clamped(default);
        p.value = p.default;
        p
    }

    /// A selector parameter: one integer step per option.
    pub fn with_options(label: &'static str, options: &'static [&'static str], default_index: usize) -> Self {
        let max = options.len().saturating_sub(1) as f32;
        let mut p = Self::new(label, "", 0.0, max, default_index as f32, 1.0);
        p.options = options;
        p
    }

    pub fn label(&self) -> &'static str { self.label }
    pub fn unit(&self) -> &'static str { self.unit }
    pub fn value(&self) -> f32 { self.value }
    pub fn min(&self) -> f32 { self.min }
    pub fn max(&self) -> f32 { self.max }
    pub fn step(&self) -> f32 { self.step }
    pub fn default_value(&self) -> f32 { self.default }

    pub fn normalized(&self) -> f32 {
        if self.max <= self.min {
            return 0.0;
        }
        (self.value - self.min) / (self.max - self.min)
    }

    pub fn set_value(&mut self, v: f32) {
        if !v.is_finite() {
            return;
        }
        self.value = self.clamped(v);
    }

    pub fn add_steps(&mut self, steps: i32) {
        self.set_value(self.value + self.step * steps as f32);
    }

    pub fn set_normalized(&mut self, norm: f32) {
        if norm.is_nan() {
            return;
        }
        let norm = norm.clamp(0.0, 1.0);
        self.set_value(self.min + norm * (self.max - self.min));
    }

    pub fn reset(&mut self) {
        self.value = self.default;
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn option_index(&self) -> usize {
        let idx = self.value.round().max(0.0) as usize;
        idx.min(self.options.len().saturating_sub(1))
    }

    pub fn option_label(&self) -> Option<&'static str> {
        self.options.get(self.option_index()).copied()
    }

    fn clamped(&self, v: f32) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        v.clamp(self.min, self.max)
    }
}
