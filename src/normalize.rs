//! Channel name normalization for bench exports.
//!
//! The bench writes Polish headers with the unit embedded in brackets
//! (`Obroty[obr/min]`). This module holds the canonical header names used by
//! the pipeline and maps them to short English names for exported datasets.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Canonical bench header names
pub mod channels {
    pub const TURBO_PRESSURE: &str = "Ciś. pow. za turb.[Pa]";
    pub const ATMOSPHERIC_PRESSURE: &str = "Ciśnienie atmosferyczne[hPa]";
    pub const COOLANT_TEMP: &str = "ECT - wyjście z sil.[°C]";
    pub const MAF: &str = "MAF[kg/h]";
    pub const POWER: &str = "Moc[kW]";
    pub const TORQUE: &str = "Moment obrotowy[Nm]";
    pub const RPM: &str = "Obroty[obr/min]";
    pub const OIL_TEMP: &str = "Temp. oleju w misce[°C]";
    pub const AMBIENT_TEMP: &str = "Temp. otoczenia[°C]";
    pub const FUEL_TEMP: &str = "Temp. pal. na wyjściu sil.[°C]";
    pub const TURBO_AIR_TEMP: &str = "Temp. powietrza za turb.[°C]";
    pub const EXHAUST_TEMP_1: &str = "Temp. spalin 1/6[°C]";
    pub const EXHAUST_TEMP_2: &str = "Temp. spalin 2/6[°C]";
    pub const EXHAUST_TEMP_3: &str = "Temp. spalin 3/6[°C]";
    pub const EXHAUST_TEMP_4: &str = "Temp. spalin 4/6[°C]";
    pub const EXHAUST_TEMP_MEAN: &str = "Temp. spalin mean[°C]";
    pub const HUMIDITY: &str = "Wilgotność względna[%]";
    pub const FUEL_CONSUMPTION: &str = "Zużycie paliwa średnie[g/s]";

    /// Every value channel the pipeline keeps by default, in export order
    pub const VALUE_CHANNELS: [&str; 17] = [
        TURBO_PRESSURE,
        ATMOSPHERIC_PRESSURE,
        COOLANT_TEMP,
        MAF,
        POWER,
        TORQUE,
        RPM,
        OIL_TEMP,
        AMBIENT_TEMP,
        FUEL_TEMP,
        TURBO_AIR_TEMP,
        EXHAUST_TEMP_1,
        EXHAUST_TEMP_2,
        EXHAUST_TEMP_3,
        EXHAUST_TEMP_4,
        HUMIDITY,
        FUEL_CONSUMPTION,
    ];
}

/// English name pair for a source header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnglishName {
    pub full: &'static str,
    pub short: &'static str,
}

/// Mapping from source header to its English names
static NORMALIZATION_MAP: LazyLock<HashMap<&'static str, EnglishName>> = LazyLock::new(|| {
    let entries: [(&'static str, &'static str, &'static str); 16] = [
        (channels::TURBO_PRESSURE, "Air Pressure After Turbo [Pa]", "Turbo Pressure"),
        (
            channels::COOLANT_TEMP,
            "Engine Coolant Temperature at Engine Outlet [°C]",
            "Coolant Temp",
        ),
        (channels::MAF, "Mass Air Flow [kg/h]", "MAF"),
        (channels::POWER, "Engine Power [kW]", "Power"),
        (channels::TORQUE, "Engine Torque [Nm]", "Torque"),
        (channels::RPM, "Engine Speed [rpm]", "RPM"),
        (channels::OIL_TEMP, "Oil Temperature in Sump [°C]", "Oil Temp"),
        (
            channels::FUEL_TEMP,
            "Fuel Temperature at Engine Outlet [°C]",
            "Fuel Temp",
        ),
        (
            channels::TURBO_AIR_TEMP,
            "Air Temperature After Turbo [°C]",
            "Turbo Air Temp",
        ),
        (
            channels::EXHAUST_TEMP_MEAN,
            "Mean Exhaust Gas Temperature [°C]",
            "Exhaust Temp",
        ),
        (
            channels::FUEL_CONSUMPTION,
            "Average Fuel Consumption [g/s]",
            "Fuel Consump",
        ),
        // Joined fuel properties
        ("Cetane number", "Cetane Number", "Cetane number"),
        ("Density at 15 °C, kg/m3", "Density at 15 °C", "Density-15"),
        ("Viscosity at 40 °C, mm2/s", "Viscosity at 40 °C", "Viscosity-40"),
        ("Flash point, °C", "Flash Point", "Flash pt"),
        (
            "LHV (Lower Heating Value), MJ/kg",
            "LHV (Lower Heating Value)",
            "LHV",
        ),
    ];

    entries
        .into_iter()
        .map(|(source, full, short)| (source, EnglishName { full, short }))
        .collect()
});

/// Look up the English names for a source header
pub fn english_name(name: &str) -> Option<EnglishName> {
    NORMALIZATION_MAP.get(name.trim()).copied()
}

/// Renaming closure for [`crate::frame::Frame::rename_columns`]
pub fn english_rename(name: &str) -> Option<String> {
    english_name(name).map(|n| n.short.to_string())
}
