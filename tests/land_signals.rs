use std::collections::BTreeSet;

use decksignal::card::CardStack;
use decksignal::lands::{ScoredLand, curate_lands, score_lands};
use decksignal::{
    CardLite, DeckEntry, DeckLite, EngineConfig, LandTag, build_features, compress_lands,
};

fn land(count: u32, name: &str, type_line: &str, text: Option<&str>) -> DeckEntry {
    DeckEntry {
        count,
        board_section: "mainboard".to_string(),
        card: CardLite {
            name: Some(name.to_string()),
            mana_value: Some(0.0),
            type_line: Some(type_line.to_string()),
            text: text.map(str::to_string),
            ..CardLite::default()
        },
    }
}

fn spell(count: u32, name: &str, text: &str) -> DeckEntry {
    DeckEntry {
        count,
        board_section: "mainboard".to_string(),
        card: CardLite {
            name: Some(name.to_string()),
            mana_value: Some(3.0),
            mana_cost: Some("{2}{G}".to_string()),
            type_line: Some("Creature — Elemental".to_string()),
            text: Some(text.to_string()),
            color_identity: None,
        },
    }
}

fn scored(name: &str, score: f64, tags: &[LandTag]) -> ScoredLand {
    ScoredLand {
        name: name.to_string(),
        count: 1,
        tags: tags.iter().copied().collect(),
        score,
    }
}

const EVOLVING_WILDS: &str = "{T}, Sacrifice Evolving Wilds: Search your library for a basic land card, put it onto the battlefield tapped, then shuffle.";
const COMMAND_TOWER: &str = "{T}: Add one mana of any color in your commander's color identity.";

#[test]
fn threshold_is_inclusive_at_default_bar() {
    let config = EngineConfig::default();
    let lands = vec![
        scored("At Bar", 2.6, &[LandTag::Draw]),
        scored("Below Bar", 2.59, &[LandTag::Draw]),
    ];
    let curated = curate_lands(lands, 0.0, &config);
    let names: Vec<&str> = curated.iter().map(|land| land.name.as_str()).collect();
    assert_eq!(names, vec!["At Bar"]);
}

#[test]
fn scored_fetch_on_the_bar_is_kept() {
    let config = EngineConfig::default();
    let wilds = CardStack::from_card(&land(1, "Evolving Wilds", "Land", Some(EVOLVING_WILDS)).card, 1);

    // 2.0 * (1 + 0.35 ln 2) = 2.4852, plus 0.9 * context.
    let on_bar = score_lands(std::slice::from_ref(&wilds), 0.125);
    assert_eq!(on_bar[0].score, 2.6);
    assert_eq!(curate_lands(on_bar, 0.125, &config).len(), 1);

    let below_bar = score_lands(std::slice::from_ref(&wilds), 0.115);
    assert_eq!(below_bar[0].score, 2.59);
    assert!(curate_lands(below_bar, 0.115, &config).is_empty());
}

#[test]
fn untagged_lands_never_surface() {
    let config = EngineConfig::default();
    let curated = curate_lands(vec![scored("Odd", 9.0, &[])], 0.0, &config);
    assert!(curated.is_empty());
}

#[test]
fn split_entries_merge_with_summed_counts() {
    let config = EngineConfig::default();
    let curated = curate_lands(
        vec![
            scored("Command Tower", 2.73, &[LandTag::CommanderSupport]),
            scored("Command Tower", 2.73, &[LandTag::ColorShift]),
        ],
        0.0,
        &config,
    );
    assert_eq!(curated.len(), 1);
    assert_eq!(curated[0].count, 2);
    let tags: BTreeSet<LandTag> = curated[0].tags.iter().copied().collect();
    assert_eq!(
        tags,
        BTreeSet::from([LandTag::CommanderSupport, LandTag::ColorShift])
    );
}

#[test]
fn command_tower_rows_merge_end_to_end() {
    let deck = DeckLite {
        id: "tower".to_string(),
        commander: None,
        deck_cards: vec![
            land(1, "Command Tower", "Land", Some(COMMAND_TOWER)),
            land(1, "Command Tower", "Land", None),
        ],
    };
    let compression = compress_lands(&deck).expect("lands");
    assert_eq!(compression.signal_lands.len(), 1);
    let tower = &compression.signal_lands[0];
    assert_eq!(tower.count, 2);
    assert_eq!(tower.tags, vec![LandTag::CommanderSupport]);
    assert_eq!(tower.why, "commander support");
}

#[test]
fn basic_forest_is_never_a_signal() {
    let deck = DeckLite {
        id: "forests".to_string(),
        commander: None,
        deck_cards: vec![land(30, "Forest", "Basic Land — Forest", None)],
    };
    let compression = compress_lands(&deck).expect("lands");
    assert!(compression.signal_lands.is_empty());
    assert_eq!(compression.mana_pool.green, 30.0);

    let features = build_features(&deck).expect("features");
    assert_eq!(features.mana_pool.green, 30.0);
}

#[test]
fn fetch_lands_need_a_land_matters_deck() {
    let plain = DeckLite {
        id: "plain".to_string(),
        commander: None,
        deck_cards: vec![
            land(1, "Evolving Wilds", "Land", Some(EVOLVING_WILDS)),
            spell(1, "Bear", "Trample"),
        ],
    };
    let compression = compress_lands(&plain).expect("lands");
    assert!(compression.signal_lands.is_empty());

    let landfall = "Landfall — Whenever a land you control enters, put a +1/+1 counter on target creature.";
    let lands_matter = DeckLite {
        id: "landfall".to_string(),
        commander: None,
        deck_cards: vec![
            land(1, "Evolving Wilds", "Land", Some(EVOLVING_WILDS)),
            spell(1, "Landfall One", landfall),
            spell(1, "Landfall Two", landfall),
            spell(1, "Landfall Three", landfall),
        ],
    };
    let compression = compress_lands(&lands_matter).expect("lands");
    assert!(compression.land_context_score >= 3.0);
    assert_eq!(compression.signal_lands.len(), 1);
    assert_eq!(compression.signal_lands[0].tags, vec![LandTag::Fetch]);
}

#[test]
fn signal_lands_are_capped() {
    let config = EngineConfig {
        signal_land_cap: 2,
        ..EngineConfig::default()
    };
    let lands = (0..5)
        .map(|i| scored(&format!("Land {i}"), 3.0 + i as f64, &[LandTag::Draw]))
        .collect();
    let curated = curate_lands(lands, 0.0, &config);
    let names: Vec<&str> = curated.iter().map(|land| land.name.as_str()).collect();
    assert_eq!(names, vec!["Land 4", "Land 3"]);
}
