use std::fmt::Display;

use crate::unit::{Humidity, Temperature, Unit, UvLight, VisibleLight, Wind};

/// Named climate setpoint. Undefined units are not controlled.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub name: String,
    pub temperature: Temperature,
    pub humidity: Humidity,
    pub wind: Wind,
    pub visible_light: VisibleLight,
    pub uv_light: UvLight,
}

impl State {
    /// State with every unit undefined.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            temperature: Temperature::undefined(),
            humidity: Humidity::undefined(),
            wind: Wind::undefined(),
            visible_light: VisibleLight::undefined(),
            uv_light: UvLight::undefined(),
        }
    }

    pub fn with_temperature(mut self, value: f64) -> Self {
        self.temperature = Temperature(value);
        self
    }

    pub fn with_humidity(mut self, value: f64) -> Self {
        self.humidity = Humidity(value);
        self
    }

    pub fn with_wind(mut self, value: f64) -> Self {
        self.wind = Wind(value);
        self
    }

    pub fn with_visible_light(mut self, value: f64) -> Self {
        self.visible_light = VisibleLight(value);
        self
    }

    pub fn with_uv_light(mut self, value: f64) -> Self {
        self.uv_light = UvLight(value);
        self
    }

    /// Unit-wise blend towards `to`. The result keeps the name of `self` until
    /// the blend is complete.
    pub fn blend(&self, to: &State, completion: f64) -> State {
        let name = if completion >= 1.0 { &to.name } else { &self.name };

        State {
            name: name.clone(),
            temperature: self.temperature.blend(&to.temperature, completion),
            humidity: self.humidity.blend(&to.humidity, completion),
            wind: self.wind.blend(&to.wind, completion),
            visible_light: self.visible_light.blend(&to.visible_light, completion),
            uv_light: self.uv_light.blend(&to.uv_light, completion),
        }
    }

    /// Every unit clamped into its physical range. Undefined units stay undefined.
    pub fn clamped(&self) -> State {
        fn clamp_defined<U: Unit>(unit: U) -> U {
            if unit.is_undefined() { unit } else { unit.clamp() }
        }

        State {
            name: self.name.clone(),
            temperature: clamp_defined(self.temperature),
            humidity: clamp_defined(self.humidity),
            wind: clamp_defined(self.wind),
            visible_light: clamp_defined(self.visible_light),
            uv_light: clamp_defined(self.uv_light),
        }
    }

    pub(crate) fn nan_unit(&self) -> Option<&'static str> {
        [
            ("temperature", self.temperature.value()),
            ("humidity", self.humidity.value()),
            ("wind", self.wind.value()),
            ("visible-light", self.visible_light.value()),
            ("uv-light", self.uv_light.value()),
        ]
        .into_iter()
        .find(|(_, value)| value.is_nan())
        .map(|(unit, _)| unit)
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[temperature={}, humidity={}, wind={}, visible-light={}, uv-light={}]",
            self.name, self.temperature, self.humidity, self.wind, self.visible_light, self.uv_light
        )
    }
}
