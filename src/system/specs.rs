use liblegion::mgmt::{Management, HARDWARE_NAMESPACE, INVENTORY_NAMESPACE};

use crate::utils::clean_display_string;

/// Some BIOS revisions leave the product table at this placeholder.
const BIOS_PLACEHOLDER: &str = "Default string";
/// Thermal-zone readings at or above this (deci-Kelvin) are sensor garbage.
const MAX_PLAUSIBLE_DECIKELVIN: i32 = 4000;

#[derive(Debug, Clone)]
pub struct SystemSpecs {
    /// "Model" or "Model (SKU)" for the header line.
    pub device_model: String,
}

impl Default for SystemSpecs {
    fn default() -> Self {
        Self { device_model: "Legion Go".to_string() }
    }
}

/// Read the model and SKU strings from the firmware product table.
pub fn get_system_specs<M: Management>(mgmt: &M) -> SystemSpecs {
    let product_query = "SELECT Name, SKUNumber FROM Win32_ComputerSystemProduct";
    let read = |field: &str| {
        mgmt.query_scalar(INVENTORY_NAMESPACE, product_query, field)
            .and_then(|value| value.into_text())
            .map(|text| clean_display_string(&text))
            .filter(|text| !text.is_empty() && text != BIOS_PLACEHOLDER)
    };

    let model = read("Name").unwrap_or_else(|| "Legion Go".to_string());
    let device_model = match read("SKUNumber") {
        Some(sku) => format!("{model} ({sku})"),
        None => model,
    };
    SystemSpecs { device_model }
}

/// Hottest plausible ACPI thermal zone, in °C.
pub fn get_cpu_temperature<M: Management>(mgmt: &M) -> Option<f64> {
    let readings = mgmt.query_all(
        HARDWARE_NAMESPACE,
        "SELECT CurrentTemperature FROM MSAcpi_ThermalZoneTemperature",
        "CurrentTemperature",
    );
    readings
        .iter()
        .filter_map(|value| value.as_i32())
        .filter(|&deci_kelvin| deci_kelvin > 0 && deci_kelvin < MAX_PLAUSIBLE_DECIKELVIN)
        .max()
        .map(|deci_kelvin| f64::from(deci_kelvin) / 10.0 - 273.15)
}

/// Header-ready temperature label.
pub fn format_cpu_temperature(celsius: Option<f64>) -> String {
    match celsius {
        Some(celsius) => {
            let fahrenheit = celsius * 9.0 / 5.0 + 32.0;
            format!("CPU: {celsius:.1}°C / {fahrenheit:.0}°F")
        }
        None => "CPU: --".to_string(),
    }
}
