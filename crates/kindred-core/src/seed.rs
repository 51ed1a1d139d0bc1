//! The family shown on first run and after a reset.

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{
    Biography, Person, PersonId, Position, Relationship, RelationshipId, RelationshipKind,
};
use crate::snapshot::Snapshot;

fn midnight(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()
}

fn person(id: &str, x: f64, y: f64, data: Biography) -> Person {
    Person {
        id: PersonId::new(id),
        position: Position::new(x, y),
        data,
    }
}

fn parent_of(id: &str, parent: &str, child: &str) -> Relationship {
    Relationship {
        id: RelationshipId::new(id),
        source: PersonId::new(parent),
        target: PersonId::new(child),
        kind: RelationshipKind::ParentChild,
    }
}

/// John Smith and his two children.
#[must_use]
pub fn initial_family() -> Snapshot {
    let john = Biography {
        first_name: "John".into(),
        middle_name: "Robert".into(),
        last_name: "Smith".into(),
        goes_by: "John".into(),
        gender: Some("male".into()),
        birth_date: midnight(1950, 1, 15),
        notes: "Family patriarch".into(),
        ..Biography::default()
    };
    let sarah = Biography {
        first_name: "Sarah".into(),
        middle_name: "Marie".into(),
        last_name: "Smith".into(),
        goes_by: "Sarah".into(),
        gender: Some("female".into()),
        birth_date: midnight(1975, 5, 20),
        ..Biography::default()
    };
    let mike = Biography {
        first_name: "Michael".into(),
        middle_name: "James".into(),
        last_name: "Smith".into(),
        goes_by: "Mike".into(),
        gender: Some("male".into()),
        birth_date: midnight(1978, 8, 10),
        ..Biography::default()
    };

    Snapshot::new(
        vec![
            person("1", 250.0, 100.0, john),
            person("2", 100.0, 280.0, sarah),
            person("3", 400.0, 280.0, mike),
        ],
        vec![parent_of("e1-2", "1", "2"), parent_of("e1-3", "1", "3")],
    )
}
