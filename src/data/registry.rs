//! Static registry of the EIA price series this tool knows about.

use crate::domain::{Frequency, SeriesDefinition};

const SPOT: &str = "petroleum/pri/spt";
const RETAIL: &str = "petroleum/pri/gnd";
const NATURAL_GAS: &str = "natural-gas/pri/fut";

static SERIES: [SeriesDefinition; 8] = [
    SeriesDefinition {
        name: "WTI Crude Oil Spot Price",
        route: SPOT,
        series_id: "RWTC",
        frequency: Frequency::Daily,
        description: "Cushing, OK WTI Spot Price FOB (Dollars per Barrel)",
    },
    SeriesDefinition {
        name: "Brent Crude Oil Spot Price",
        route: SPOT,
        series_id: "RBRTE",
        frequency: Frequency::Daily,
        description: "Europe Brent Spot Price FOB (Dollars per Barrel)",
    },
    SeriesDefinition {
        name: "NY Harbor Conventional Gasoline",
        route: SPOT,
        series_id: "EER_EPMRU_PF4_Y35NY_DPG",
        frequency: Frequency::Daily,
        description: "New York Harbor Conventional Gasoline Regular Spot Price (Dollars per Gallon)",
    },
    SeriesDefinition {
        name: "U.S. Regular Gasoline Price",
        route: RETAIL,
        series_id: "EMD_EPD2D_PTE_NUS_DPG",
        frequency: Frequency::Daily,
        description: "U.S. Regular All Formulations Retail Gasoline Prices (Dollars per Gallon)",
    },
    SeriesDefinition {
        name: "U.S. Diesel Price",
        route: RETAIL,
        series_id: "EMD_EPD2DXL0_PTE_NUS_DPG",
        frequency: Frequency::Daily,
        description: "U.S. No 2 Diesel Retail Prices (Dollars per Gallon)",
    },
    SeriesDefinition {
        name: "Heating Oil NY Harbor",
        route: SPOT,
        series_id: "EER_EPD2F_PF4_Y35NY_DPG",
        frequency: Frequency::Daily,
        description: "New York Harbor No. 2 Heating Oil Spot Price (Dollars per Gallon)",
    },
    SeriesDefinition {
        name: "Natural Gas Henry Hub",
        route: NATURAL_GAS,
        series_id: "RNGC1",
        frequency: Frequency::Daily,
        description: "Henry Hub Natural Gas Spot Price (Dollars per Million Btu)",
    },
    SeriesDefinition {
        name: "Propane Mont Belvieu",
        route: SPOT,
        series_id: "EER_EPLLPA_PF4_Y44MB_DPG",
        frequency: Frequency::Daily,
        description: "Mont Belvieu, TX Propane Spot Price (Dollars per Gallon)",
    },
];

/// Series selected when the user does not pick any.
pub const DEFAULT_SELECTION: [&str; 2] = ["WTI Crude Oil Spot Price", "Brent Crude Oil Spot Price"];

/// All registry entries, in display order.
pub fn all() -> &'static [SeriesDefinition] {
    &SERIES
}

pub fn lookup(name: &str) -> Option<&'static SeriesDefinition> {
    SERIES.iter().find(|def| def.name == name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    SERIES.iter().map(|def| def.name)
}
