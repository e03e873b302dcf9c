//! Synthetic tenant identities, table schema, rows and search queries

use rand::Rng;
use serde_json::{json, Value};
use stampede_http::{
    ColumnDefinition, ColumnType, CreateTableRequest, FilterField, SearchRequest, SignupRequest,
    SortDirection,
};

pub const STATUSES: [&str; 4] = ["open", "in_progress", "blocked", "complete"];
pub const CATEGORIES: [&str; 4] = ["electrical", "mechanical", "safety", "general"];
pub const SORT_FIELDS: [&str; 4] = ["created_at", "title", "status", "category"];
pub const PAGE_SIZES: [u32; 4] = [10, 25, 50, 100];

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

/// Lowercase alphanumeric string
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(*pick(rng, ALPHABET))).collect()
}

/// Signup body for tenant `index`; the organisation slug is randomised
pub fn tenant_identity<R: Rng + ?Sized>(index: usize, rng: &mut R) -> SignupRequest {
    SignupRequest {
        email: format!("stress{}@example.com", index),
        username: format!("stress{}", index),
        name: format!("Stress Tester {}", index),
        password: format!("Passw0rd!{}", index),
        org_slug: format!("org-{}-{}", index, random_string(rng, 6)),
    }
}

pub fn table_request<R: Rng + ?Sized>(table_index: usize, rng: &mut R) -> CreateTableRequest {
    CreateTableRequest {
        name: format!("work_items_{}_{}", table_index, random_string(rng, 4)),
    }
}

/// Columns defined on every table, in creation order
pub fn work_item_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("title", ColumnType::Text)
            .required()
            .indexed(),
        ColumnDefinition::new("status", ColumnType::Enum)
            .required()
            .indexed()
            .with_values(STATUSES),
        ColumnDefinition::new("category", ColumnType::Enum)
            .indexed()
            .with_values(CATEGORIES),
        ColumnDefinition::new("cost", ColumnType::Float),
        ColumnDefinition::new("completed", ColumnType::Bool),
    ]
}

/// Row values matching [`work_item_columns`]
pub fn row_payload<R: Rng + ?Sized>(index: usize, rng: &mut R) -> Value {
    let status = *pick(rng, &STATUSES);
    let category = *pick(rng, &CATEGORIES);
    let cost = (rng.gen_range(10.0..=5000.0_f64) * 100.0).round() / 100.0;
    let completed = status == "complete" && rng.gen_bool(0.8);

    json!({
        "title": format!("Work item {} - {}", index, status),
        "status": status,
        "category": category,
        "cost": cost,
        "completed": completed,
    })
}

/// Randomised search over the work item columns
pub fn search_payload<R: Rng + ?Sized>(rng: &mut R) -> SearchRequest {
    let mut filter_fields = Vec::new();
    if rng.gen_bool(0.7) {
        filter_fields.push(FilterField::eq("status", *pick(rng, &STATUSES)));
    }
    if rng.gen_bool(0.4) {
        filter_fields.push(FilterField::eq("category", *pick(rng, &CATEGORIES)));
    }
    if rng.gen_bool(0.3) {
        filter_fields.push(FilterField::eq("completed", rng.gen_bool(0.5)));
    }

    SearchRequest {
        page_num: rng.gen_range(0..=4),
        page_size: *pick(rng, &PAGE_SIZES),
        filter_fields,
        sort_field: pick(rng, &SORT_FIELDS).to_string(),
        direction: if rng.gen_bool(0.5) {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_tenant_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let identity = tenant_identity(3, &mut rng);
        assert_eq!(identity.email, "stress3@example.com");
        assert_eq!(identity.username, "stress3");
        assert_eq!(identity.name, "Stress Tester 3");
        assert_eq!(identity.password, "Passw0rd!3");
        assert!(identity.org_slug.starts_with("org-3-"));
        assert_eq!(identity.org_slug.len(), "org-3-".len() + 6);
        assert!(identity
            .org_slug
            .chars()
            .all(|c| c == '-' || c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_table_request_name() {
        let mut rng = StdRng::seed_from_u64(2);
        let request = table_request(1, &mut rng);
        assert!(request.name.starts_with("work_items_1_"));
        assert_eq!(request.name.len(), "work_items_1_".len() + 4);
    }

    #[test]
    fn test_columns_in_order() {
        let names: Vec<String> = work_item_columns().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["title", "status", "category", "cost", "completed"]);

        let columns = work_item_columns();
        assert!(columns[0].required && columns[0].indexed);
        assert!(columns[1].required && columns[1].indexed);
        assert!(!columns[2].required && columns[2].indexed);
        assert_eq!(columns[2].enum_values.as_deref().map(<[String]>::len), Some(4));
        assert!(columns[3].enum_values.is_none());
    }

    #[test]
    fn test_row_payload_values() {
        let mut rng = StdRng::seed_from_u64(3);
        for index in 0..200 {
            let row = row_payload(index, &mut rng);
            let status = row["status"].as_str().unwrap();
            assert!(STATUSES.contains(&status));
            assert!(CATEGORIES.contains(&row["category"].as_str().unwrap()));
            assert_eq!(
                row["title"].as_str().unwrap(),
                format!("Work item {} - {}", index, status)
            );

            let cost = row["cost"].as_f64().unwrap();
            assert!((10.0..=5000.0).contains(&cost));
            assert!(((cost * 100.0).round() - cost * 100.0).abs() < 1e-6);

            if status != "complete" {
                assert_eq!(row["completed"], false);
            }
        }
    }

    #[test]
    fn test_search_payload_values() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 {
            let search = search_payload(&mut rng);
            assert!(search.page_num <= 4);
            assert!(PAGE_SIZES.contains(&search.page_size));
            assert!(SORT_FIELDS.contains(&search.sort_field.as_str()));
            assert!(search.filter_fields.len() <= 3);
            for filter in &search.filter_fields {
                assert_eq!(filter.operation, "eq");
                assert!(["status", "category", "completed"].contains(&filter.field.as_str()));
            }
        }
    }

    #[test]
    fn test_seeded_payloads_repeat() {
        let first = row_payload(0, &mut StdRng::seed_from_u64(9));
        let second = row_payload(0, &mut StdRng::seed_from_u64(9));
        assert_eq!(first, second);
    }
}
