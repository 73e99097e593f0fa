//! Deterministic name and address generation from curated lists.

use crate::rng::DemoRng;

pub struct NameGenerator;

impl NameGenerator {
    pub fn generate_first_name(rng: &mut DemoRng) -> &'static str {
        *rng.pick(Self::first_names())
    }

    pub fn generate_last_name(rng: &mut DemoRng) -> &'static str {
        *rng.pick(Self::last_names())
    }

    /// "<number> <street>"
    pub fn generate_street(rng: &mut DemoRng) -> String {
        let number = rng.range_inclusive(1, 9999);
        format!("{number} {}", rng.pick(Self::streets()))
    }

    pub fn generate_city(rng: &mut DemoRng) -> &'static str {
        *rng.pick(Self::cities())
    }

    pub fn generate_state(rng: &mut DemoRng) -> &'static str {
        *rng.pick(Self::states())
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "John", "Jane", "Michael", "Sarah", "David", "Emily", "Robert", "Lisa",
            "James", "Mary", "William", "Patricia", "Richard", "Jennifer", "Joseph",
            "Linda", "Thomas", "Barbara", "Charles", "Susan", "Christopher", "Jessica",
            "Daniel", "Karen", "Matthew", "Nancy", "Anthony", "Betty", "Mark", "Helen",
            "Donald", "Sandra",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller",
            "Davis", "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez",
            "Wilson", "Anderson", "Thomas", "Taylor", "Moore", "Jackson", "Martin",
            "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez", "Clark",
            "Ramirez", "Lewis", "Robinson", "Walker", "Young",
        ]
    }

    fn streets() -> &'static [&'static str] {
        &["Main St", "Oak Ave", "Pine Rd", "Elm Dr", "Maple Ln"]
    }

    fn cities() -> &'static [&'static str] {
        &[
            "New York", "Los Angeles", "Chicago", "Houston", "Phoenix", "Philadelphia",
            "San Antonio", "San Diego", "Dallas", "Austin", "Seattle", "Denver",
        ]
    }

    fn states() -> &'static [&'static str] {
        &["NY", "CA", "IL", "TX", "AZ", "PA", "WA", "CO", "FL", "GA"]
    }
}
