//! The `adaptest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create adaptest.toml
    if std::path::Path::new("adaptest.toml").exists() {
        println!("adaptest.toml already exists, skipping.");
    } else {
        std::fs::write("adaptest.toml", SAMPLE_CONFIG)?;
        println!("Created adaptest.toml");
    }

    // Create example item bank
    std::fs::create_dir_all("banks")?;
    let example_path = std::path::Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: adaptest validate --bank banks/example.toml --config adaptest.toml");
    println!("  2. Run: adaptest simulate --bank banks/example.toml --config adaptest.toml --ability 1.0 --seed 42");
    println!("  3. Replace the example bank with your calibrated item pool");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest exam configuration
#
# The example bank is tiny, so the exam bounds here are far below a real
# administration. Omitting [test_plan] falls back to the published NCLEX
# Client Needs distribution.

[exam]
min_items = 8
max_items = 16
se_threshold = 0.3
cut_score = 0.0
exposure_top_k = 3
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example item bank"

[[items]]
id = "moc-001"
category = "management_of_care"
discrimination = 1.2
difficulty = -0.6
guessing = 0.25
key = "b"
stem = "Which client should the nurse assess first after shift report?"

[[items]]
id = "moc-002"
category = "management_of_care"
discrimination = 1.0
difficulty = 0.7
guessing = 0.25
key = "a"
stem = "Which task is appropriate to delegate to assistive personnel?"

[[items]]
id = "sic-001"
category = "safety_and_infection_control"
discrimination = 1.4
difficulty = -0.2
guessing = 0.2
key = "c"
stem = "Which precaution is required for a client with pulmonary tuberculosis?"

[[items]]
id = "sic-002"
category = "safety_and_infection_control"
discrimination = 0.9
difficulty = 0.9
guessing = 0.2
key = "d"
stem = "Which action violates surgical asepsis?"

[[items]]
id = "hpm-001"
category = "health_promotion_and_maintenance"
discrimination = 1.1
difficulty = -0.8
guessing = 0.25
key = "a"
stem = "Which immunization is recommended at the 12-month well-child visit?"

[[items]]
id = "hpm-002"
category = "health_promotion_and_maintenance"
discrimination = 1.0
difficulty = 0.4
guessing = 0.25
key = "b"
stem = "Which finding in a 28-week gestation client requires teaching?"

[[items]]
id = "psy-001"
category = "psychosocial_integrity"
discrimination = 0.8
difficulty = -0.4
guessing = 0.2
key = "d"
stem = "Which response is therapeutic for a client expressing hopelessness?"

[[items]]
id = "psy-002"
category = "psychosocial_integrity"
discrimination = 1.3
difficulty = 0.6
guessing = 0.2
key = "c"
stem = "Which behavior indicates escalating agitation in the milieu?"

[[items]]
id = "bcc-001"
category = "basic_care_and_comfort"
discrimination = 1.0
difficulty = -1.0
guessing = 0.25
key = "a"
stem = "Which position is indicated after a lumbar puncture?"

[[items]]
id = "bcc-002"
category = "basic_care_and_comfort"
discrimination = 1.2
difficulty = 0.3
guessing = 0.25
key = "b"
stem = "Which diet modification is appropriate for dysphagia?"

[[items]]
id = "pht-001"
category = "pharmacological_therapies"
discrimination = 1.5
difficulty = -0.1
guessing = 0.2
key = "c"
stem = "Which assessment is required before administering digoxin?"

[[items]]
id = "pht-002"
category = "pharmacological_therapies"
discrimination = 1.1
difficulty = 1.1
guessing = 0.2
key = "a"
stem = "Which laboratory value requires holding the heparin infusion?"

[[items]]
id = "rrp-001"
category = "reduction_of_risk_potential"
discrimination = 0.9
difficulty = -0.5
guessing = 0.25
key = "b"
stem = "Which finding after cardiac catheterization requires immediate action?"

[[items]]
id = "rrp-002"
category = "reduction_of_risk_potential"
discrimination = 1.3
difficulty = 0.8
guessing = 0.25
key = "d"
stem = "Which preoperative result should be reported before surgery?"

[[items]]
id = "pha-001"
category = "physiological_adaptation"
discrimination = 1.2
difficulty = -0.3
guessing = 0.2
key = "a"
stem = "Which intervention is priority for a client in diabetic ketoacidosis?"

[[items]]
id = "pha-002"
category = "physiological_adaptation"
discrimination = 1.4
difficulty = 1.2
guessing = 0.2
key = "c"
stem = "Which ventilator alarm indicates a possible circuit disconnection?"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use adaptest_core::model::Category;

    #[test]
    fn example_bank_parses_and_covers_every_category() {
        let items = adaptest_bank::loader::parse_bank(EXAMPLE_BANK).unwrap();
        assert_eq!(items.len(), 16);
        for category in Category::ALL {
            assert_eq!(
                items.iter().filter(|i| i.category == category).count(),
                2,
                "category {category} should have two items"
            );
        }
    }

    #[test]
    fn sample_config_parses() {
        let config = adaptest_core::parser::parse_config(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.min_items, 8);
        assert_eq!(config.max_items, 16);
        assert_eq!(config.exposure_top_k, 3);
    }
}
