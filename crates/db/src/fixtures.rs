use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use loadline_core::{Load, LoadId, RepositoryError};

use crate::repositories::SqlLoadRepository;
use crate::DbPool;

/// Deterministic demo lanes for local runs and smoke checks. All seeded loads
/// start unbooked; rates are whole dollars.
struct SeedLoad {
    load_id: &'static str,
    origin: &'static str,
    destination: &'static str,
    equipment_type: &'static str,
    listed_rate: i64,
    weight_lbs: i64,
    commodity: &'static str,
    miles: i64,
    pickup_in_hours: i64,
}

const SEED_LOADS: &[SeedLoad] = &[
    SeedLoad {
        load_id: "LD-1001",
        origin: "Chicago, IL",
        destination: "Dallas, TX",
        equipment_type: "Dry Van",
        listed_rate: 1_000,
        weight_lbs: 42_000,
        commodity: "paper goods",
        miles: 968,
        pickup_in_hours: 18,
    },
    SeedLoad {
        load_id: "LD-1002",
        origin: "Atlanta, GA",
        destination: "Miami, FL",
        equipment_type: "Reefer",
        listed_rate: 1_450,
        weight_lbs: 38_500,
        commodity: "produce",
        miles: 662,
        pickup_in_hours: 9,
    },
    SeedLoad {
        load_id: "LD-1003",
        origin: "Denver, CO",
        destination: "Phoenix, AZ",
        equipment_type: "Flatbed",
        listed_rate: 1_900,
        weight_lbs: 45_000,
        commodity: "steel coils",
        miles: 821,
        pickup_in_hours: 30,
    },
    SeedLoad {
        load_id: "LD-1004",
        origin: "Chicago, IL",
        destination: "Columbus, OH",
        equipment_type: "Dry Van",
        listed_rate: 750,
        weight_lbs: 26_000,
        commodity: "retail freight",
        miles: 356,
        pickup_in_hours: 12,
    },
    SeedLoad {
        load_id: "LD-1005",
        origin: "Los Angeles, CA",
        destination: "Seattle, WA",
        equipment_type: "Reefer",
        listed_rate: 2_600,
        weight_lbs: 41_000,
        commodity: "frozen foods",
        miles: 1_135,
        pickup_in_hours: 24,
    },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub inserted: usize,
}

/// Upsert the demo loads; safe to run repeatedly.
pub async fn seed_demo_loads(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
    let repository = SqlLoadRepository::new(pool.clone());
    let now = Utc::now();

    for seed in SEED_LOADS {
        let load = Load {
            load_id: LoadId(seed.load_id.to_string()),
            origin: seed.origin.to_string(),
            destination: seed.destination.to_string(),
            equipment_type: seed.equipment_type.to_string(),
            listed_rate: Decimal::new(seed.listed_rate, 0),
            booked: false,
            agreed_rate: None,
            pickup_at: Some(now + Duration::hours(seed.pickup_in_hours)),
            delivery_at: Some(now + Duration::hours(seed.pickup_in_hours + 36)),
            weight_lbs: Some(seed.weight_lbs),
            commodity: Some(seed.commodity.to_string()),
            num_pieces: None,
            miles: Some(seed.miles),
            dimensions: None,
            notes: None,
        };
        repository.insert(&load).await?;
    }

    Ok(SeedResult { inserted: SEED_LOADS.len() })
}

#[cfg(test)]
mod tests {
    use loadline_core::{LoadId, LoadRepository};

    use crate::repositories::{LoadFilters, LoadSearch, SqlLoadRepository};
    use crate::{connect_with_settings, migrations};

    use super::seed_demo_loads;

    #[tokio::test]
    async fn seeding_is_idempotent_and_searchable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let first = seed_demo_loads(&pool).await.expect("first seed");
        let second = seed_demo_loads(&pool).await.expect("second seed");
        assert_eq!(first, second);

        let repo = SqlLoadRepository::new(pool);
        let chicago = repo
            .search(&LoadFilters { origin: "chicago".to_string(), ..LoadFilters::default() })
            .await
            .expect("search");
        assert_eq!(chicago.len(), 2);

        let load = repo
            .get(&LoadId("LD-1001".to_string()))
            .await
            .expect("get")
            .expect("seeded load exists");
        assert!(!load.booked);
        assert!(load.booking_consistent());
    }
}
