use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

// ============================================================================
// ENUMS
// ============================================================================

/// Broad crop grouping that drives the seasonal price curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CropCategory {
    /// Staple grains — peak near harvest months (Oct-Dec in the reference tables)
    Grain,
    /// Vegetables — richer in the off-season (summer months)
    Vegetable,
    /// Pulses
    Pulse,
    /// Commercial crops (cotton, sugarcane, ...)
    Commercial,
}

// ============================================================================
// PROFILE STRUCTS
// ============================================================================

/// Synthetic-generator parameters for one crop.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CropProfile {
    /// Baseline modal price in rupees per quintal.
    pub base_price: f64,
    /// Relative spread of day-to-day variation (0.08 = +/- 8%).
    pub variance: f64,
    pub category: CropCategory,
}

/// Per-state market parameters for the synthetic generator.
#[derive(Debug, Clone, Serialize)]
pub struct StateProfile {
    /// Market-premium multiplier applied on top of the crop base price.
    pub premium: f64,
    /// Static mandi list the generator draws market names from.
    pub mandis: &'static [&'static str],
}

// ============================================================================
// STATIC TABLES (Lazy initialization, O(1) lookup)
// ============================================================================

// The numeric values here are hand-tuned defaults, not authoritative market
// data. They only need to produce plausible synthetic quotes.

static CROPS: Lazy<HashMap<&'static str, CropProfile>> = Lazy::new(|| {
    use CropCategory::*;
    HashMap::from([
        ("rice",      CropProfile { base_price: 2200.0, variance: 0.08, category: Grain }),
        ("wheat",     CropProfile { base_price: 2100.0, variance: 0.07, category: Grain }),
        ("maize",     CropProfile { base_price: 1800.0, variance: 0.09, category: Grain }),
        ("bajra",     CropProfile { base_price: 2000.0, variance: 0.08, category: Grain }),
        ("jowar",     CropProfile { base_price: 2600.0, variance: 0.08, category: Grain }),
        ("tomato",    CropProfile { base_price: 1500.0, variance: 0.20, category: Vegetable }),
        ("onion",     CropProfile { base_price: 1700.0, variance: 0.18, category: Vegetable }),
        ("potato",    CropProfile { base_price: 1200.0, variance: 0.15, category: Vegetable }),
        ("brinjal",   CropProfile { base_price: 1400.0, variance: 0.16, category: Vegetable }),
        ("cabbage",   CropProfile { base_price: 1000.0, variance: 0.17, category: Vegetable }),
        ("tur",       CropProfile { base_price: 6500.0, variance: 0.10, category: Pulse }),
        ("moong",     CropProfile { base_price: 7200.0, variance: 0.10, category: Pulse }),
        ("urad",      CropProfile { base_price: 6800.0, variance: 0.10, category: Pulse }),
        ("gram",      CropProfile { base_price: 5000.0, variance: 0.09, category: Pulse }),
        ("cotton",    CropProfile { base_price: 6200.0, variance: 0.12, category: Commercial }),
        ("sugarcane", CropProfile { base_price: 350.0,  variance: 0.05, category: Commercial }),
        ("groundnut", CropProfile { base_price: 5800.0, variance: 0.11, category: Commercial }),
        ("soybean",   CropProfile { base_price: 4400.0, variance: 0.11, category: Commercial }),
    ])
});

static STATES: Lazy<HashMap<&'static str, StateProfile>> = Lazy::new(|| {
    HashMap::from([
        ("punjab",         StateProfile { premium: 1.08, mandis: &["Khanna", "Ludhiana", "Amritsar", "Patiala", "Bathinda"] }),
        ("haryana",        StateProfile { premium: 1.06, mandis: &["Karnal", "Hisar", "Sirsa", "Ambala", "Rohtak"] }),
        ("telangana",      StateProfile { premium: 1.02, mandis: &["Warangal", "Nizamabad", "Karimnagar", "Khammam", "Suryapet"] }),
        ("andhra pradesh", StateProfile { premium: 1.01, mandis: &["Guntur", "Kurnool", "Vijayawada", "Anantapur", "Nellore"] }),
        ("maharashtra",    StateProfile { premium: 1.05, mandis: &["Lasalgaon", "Pune", "Nagpur", "Nashik", "Solapur"] }),
        ("uttar pradesh",  StateProfile { premium: 0.98, mandis: &["Agra", "Kanpur", "Lucknow", "Varanasi", "Meerut"] }),
        ("madhya pradesh", StateProfile { premium: 0.97, mandis: &["Indore", "Bhopal", "Ujjain", "Mandsaur", "Jabalpur"] }),
        ("karnataka",      StateProfile { premium: 1.03, mandis: &["Hubli", "Bangalore", "Mysore", "Raichur", "Gulbarga"] }),
        ("tamil nadu",     StateProfile { premium: 1.04, mandis: &["Coimbatore", "Madurai", "Salem", "Trichy", "Erode"] }),
        ("rajasthan",      StateProfile { premium: 0.99, mandis: &["Kota", "Jaipur", "Jodhpur", "Bikaner", "Alwar"] }),
        ("gujarat",        StateProfile { premium: 1.04, mandis: &["Rajkot", "Ahmedabad", "Unjha", "Gondal", "Junagadh"] }),
        ("west bengal",    StateProfile { premium: 1.00, mandis: &["Burdwan", "Siliguri", "Kolkata", "Malda", "Asansol"] }),
    ])
});

/// Month (index 0 = January) -> price multiplier, per crop category.
static SEASONAL: Lazy<HashMap<CropCategory, [f64; 12]>> = Lazy::new(|| {
    use CropCategory::*;
    HashMap::from([
        // Grains firm up after the kharif harvest lands in mandis
        (Grain,      [1.02, 1.01, 0.99, 0.97, 0.96, 0.97, 0.98, 0.99, 1.00, 1.04, 1.06, 1.05]),
        // Vegetables spike in the summer lean months
        (Vegetable,  [0.95, 0.96, 1.00, 1.08, 1.15, 1.18, 1.12, 1.05, 1.00, 0.97, 0.94, 0.93]),
        (Pulse,      [1.01, 1.00, 0.99, 0.98, 0.99, 1.00, 1.01, 1.02, 1.02, 1.01, 1.00, 1.00]),
        (Commercial, [1.00, 1.00, 0.99, 0.98, 0.98, 0.99, 1.00, 1.01, 1.02, 1.03, 1.02, 1.01]),
    ])
});

// Fallbacks for crops/states outside the tables so the synthetic source
// still produces something plausible.
const DEFAULT_CROP: CropProfile = CropProfile {
    base_price: 2500.0,
    variance: 0.10,
    category: CropCategory::Commercial,
};

const DEFAULT_STATE: StateProfile = StateProfile {
    premium: 1.0,
    mandis: &["District Mandi", "Central Market", "APMC Yard"],
};

// ============================================================================
// REGISTRY API
// ============================================================================

pub struct Registry;

impl Registry {
    /// Lookup is case-insensitive; unknown crops get the default profile.
    pub fn crop_profile(commodity: &str) -> CropProfile {
        CROPS
            .get(commodity.trim().to_lowercase().as_str())
            .copied()
            .unwrap_or(DEFAULT_CROP)
    }

    pub fn state_profile(state: &str) -> StateProfile {
        STATES
            .get(state.trim().to_lowercase().as_str())
            .cloned()
            .unwrap_or(DEFAULT_STATE)
    }

    /// `month` is 1-based (chrono's `Datelike::month`).
    pub fn seasonal_factor(category: CropCategory, month: u32) -> f64 {
        let idx = (month.clamp(1, 12) - 1) as usize;
        SEASONAL.get(&category).map(|t| t[idx]).unwrap_or(1.0)
    }

    /// One-time sanity check over the static tables, run at service startup.
    pub fn validate() -> Result<()> {
        for (name, crop) in CROPS.iter() {
            if crop.base_price <= 0.0 {
                return Err(anyhow!("Crop '{}' has non-positive base price", name));
            }
            if crop.variance < 0.0 || crop.variance > 1.0 {
                return Err(anyhow!("Crop '{}' has variance outside [0, 1]", name));
            }
        }
        for (name, state) in STATES.iter() {
            if state.premium <= 0.0 {
                return Err(anyhow!("State '{}' has non-positive premium", name));
            }
            if state.mandis.is_empty() {
                return Err(anyhow!("State '{}' has an empty mandi list", name));
            }
        }
        for (category, table) in SEASONAL.iter() {
            if table.iter().any(|f| *f <= 0.0) {
                return Err(anyhow!("Seasonal table for {:?} has a non-positive factor", category));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_validate() {
        Registry::validate().unwrap();
    }

    #[test]
    fn test_crop_lookup_is_case_insensitive() {
        let a = Registry::crop_profile("Rice");
        let b = Registry::crop_profile("rice");
        assert_eq!(a.base_price, b.base_price);
        assert_eq!(a.category, CropCategory::Grain);
    }

    #[test]
    fn test_unknown_crop_gets_default() {
        let p = Registry::crop_profile("dragonfruit");
        assert_eq!(p.base_price, DEFAULT_CROP.base_price);
    }

    #[test]
    fn test_unknown_state_gets_default_mandis() {
        let p = Registry::state_profile("atlantis");
        assert!(!p.mandis.is_empty());
        assert_eq!(p.premium, 1.0);
    }

    #[test]
    fn test_seasonal_factor_covers_all_months() {
        for month in 1..=12 {
            let f = Registry::seasonal_factor(CropCategory::Grain, month);
            assert!(f > 0.0);
        }
    }
}
