use serde_json::{json, Value};
use synergizer::models::{CompanyProfile, Level, Need, Offer};

pub fn aqua_reach() -> CompanyProfile {
    CompanyProfile::new("Aqua Reach")
        .with_mission("Deliver clean water to remote communities")
        .with_need(Need::new("Power storage", Level::High).tagged(["energy"]))
}

pub fn grid_wise() -> CompanyProfile {
    CompanyProfile::new("Grid Wise")
        .with_mission("Stabilize rural energy grids")
        .with_offer(Offer::new("Microgrid analytics", Level::Med).tagged(["energy"]))
}

/// A needs solar, B offers solar and needs recycling, C offers recycling.
pub fn solar_chain() -> Vec<CompanyProfile> {
    vec![
        CompanyProfile::new("Alpha Solar")
            .with_need(Need::new("Solar panels", Level::Med).tagged(["solar"])),
        CompanyProfile::new("Beta Storage")
            .with_offer(Offer::new("Solar panels", Level::High).tagged(["solar"]))
            .with_need(Need::new("Battery recycling", Level::High).tagged(["recycling"])),
        CompanyProfile::new("Cyan Recycle")
            .with_offer(Offer::new("Battery recycling", Level::Med).tagged(["recycling"])),
    ]
}

/// Companies whose needs and offers share no term with anyone.
pub fn disjoint_companies(count: usize) -> Vec<CompanyProfile> {
    (0..count)
        .map(|i| {
            CompanyProfile::new(format!("Company {i}"))
                .with_need(Need::new(format!("need{i}"), Level::High).tagged([format!("alpha{i}")]))
                .with_offer(
                    Offer::new(format!("offer{i}"), Level::High).tagged([format!("omega{i}")]),
                )
        })
        .collect()
}

pub fn profile_values() -> Vec<Value> {
    vec![
        json!({
            "slug": "aqua-reach",
            "name": "Aqua Reach",
            "organization_type": "startup",
            "needs": [{ "title": "power storage", "urgency": "HIGH", "tags": ["energy"] }],
            "contacts": [{ "name": "Ada", "email": "ada@aqua.test" }]
        }),
        json!({
            "slug": "grid-wise",
            "name": "Grid Wise",
            "offers": [{ "title": "microgrid analytics", "capacity": "MED", "tags": ["energy"] }]
        }),
    ]
}

pub const BUNDLE_YAML: &str = r#"
templates:
  Startup:
    required_fields: [mission, region]
    region: Nordics
    tags: [early-stage]
  General:
    mission: Build durable partnerships
tiering_rules:
  - name: energy
    label: Energy
    criteria: [energy]
  - name: water
    label: Water
    predicate:
      any: [water, ocean]
"#;
