//! Structuring Tests (pattern backend)
//!
//! Drives the public API end to end with the local rule-based backend.

use scribo_ner::ner::{strip_annotations, PatternConfig};
use scribo_ner::{
    detect_named_entities, Address, BackendKind, Entity, NerConfig, NerError, Structurer,
};

fn address(street: &str, numbers: &[&str]) -> Address {
    Address {
        street_name: street.to_string(),
        street_numbers: numbers.iter().map(|n| n.to_string()).collect(),
    }
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Structurer that never reaches the network.
fn offline_structurer() -> Structurer {
    let mut config = NerConfig::default();
    config.bert.endpoint = String::new();
    Structurer::new(&config)
}

#[tokio::test]
async fn two_streets_each_keep_their_numbers() {
    let input = texts(&["Beaumont R., cigaretier, Saint-Honoré 270, 272 et Saint-Antoine 272."]);
    let entities = detect_named_entities(&input, "cnn").await.unwrap();

    assert_eq!(entities.len(), 1);
    let entity = &entities[0];
    assert_eq!(
        entity.addresses,
        vec![
            address("Saint-Honoré", &["270", "272"]),
            address("Saint-Antoine", &["272"]),
        ]
    );
    assert_eq!(entity.persons, vec!["Beaumont R."]);
    assert_eq!(
        entity.annotated_text,
        "<PER>Beaumont R.</PER>, <ACT>cigaretier</ACT>, <LOC>Saint-Honoré</LOC> \
         <CARDINAL>270</CARDINAL>, <CARDINAL>272</CARDINAL> et \
         <LOC>Saint-Antoine</LOC> <CARDINAL>272</CARDINAL>."
    );
}

#[tokio::test]
async fn numbers_attach_through_unlabeled_text() {
    let input = texts(&["Mme Michou, Rue du Marché Saint-Honoré, facteur, 59 et 64."]);
    let entities = offline_structurer()
        .structure_all(&input, BackendKind::Cnn)
        .await
        .unwrap();

    assert_eq!(
        entities[0].addresses,
        vec![address("Rue du Marché Saint-Honoré", &["59", "64"])]
    );
    assert_eq!(entities[0].persons, vec!["Mme Michou"]);
}

#[tokio::test]
async fn street_abbreviations_and_number_suffixes() {
    let input = texts(&["Dupont (Louis), épicier, r. de la Paix 12 bis, et boul. des Italiens 3."]);
    let entities = offline_structurer()
        .structure_all(&input, BackendKind::Cnn)
        .await
        .unwrap();

    assert_eq!(
        entities[0].addresses,
        vec![
            address("r. de la Paix", &["12 bis"]),
            address("boul. des Italiens", &["3"]),
        ]
    );
    assert_eq!(entities[0].persons, vec!["Dupont"]);
}

#[tokio::test]
async fn annotation_strips_back_to_source() {
    let input = texts(&[
        "Beaumont, fab. de registres, Ecriv.,10.",
        "Dupont & fils, <marchands>, r. de la Paix 12 bis.",
        "",
        "   ",
    ]);
    let entities = offline_structurer()
        .structure_all(&input, BackendKind::Cnn)
        .await
        .unwrap();

    for (text, entity) in input.iter().zip(&entities) {
        assert_eq!(&strip_annotations(&entity.annotated_text), text);
    }
    assert!(entities[1].annotated_text.contains("&amp;"));
    assert!(entities[1].annotated_text.contains("&lt;marchands&gt;"));
}

#[tokio::test]
async fn batch_keeps_input_order() {
    let input = texts(&[
        "Martin, boulanger, Saint-Antoine 3.",
        "",
        "Dupont (Louis), épicier, r. de la Paix 12 bis.",
    ]);
    let entities = offline_structurer()
        .structure_all(&input, BackendKind::Cnn)
        .await
        .unwrap();

    assert_eq!(entities.len(), 3);
    assert_eq!(entities[0].persons, vec!["Martin"]);
    assert_eq!(entities[1], Entity::default());
    assert_eq!(entities[2].persons, vec!["Dupont"]);
}

#[tokio::test]
async fn repeated_calls_give_identical_results() {
    let structurer = offline_structurer();
    let input = texts(&["Beaumont R., cigaretier, Saint-Honoré 270, 272 et Saint-Antoine 272."]);

    let first = structurer.structure_all(&input, BackendKind::Cnn).await.unwrap();
    let second = structurer.structure_all(&input, BackendKind::Cnn).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_backend_is_rejected() {
    let input = texts(&["Beaumont"]);
    let err = detect_named_entities(&input, "xyz").await.unwrap_err();
    assert!(matches!(err, NerError::UnknownBackend(ref name) if name == "xyz"));
}

#[tokio::test]
async fn custom_rule_file_with_extra_label() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.toml");
    std::fs::write(
        &rules,
        r#"
name = "test"

[[rules]]
label = "LOC"
pattern = '''\bquai (?:de |des |du )?\p{Lu}\p{L}*'''

[[rules]]
label = "CARDINAL"
pattern = '''\b\d+\b'''

[[rules]]
label = "DATE"
pattern = '''\b1[89]\d\d\b'''
"#,
    )
    .unwrap();

    let mut config = NerConfig::default();
    config.cnn = PatternConfig {
        model_path: Some(rules),
    };
    let structurer = Structurer::new(&config);

    let input = texts(&["Roux, depuis 1842, quai des Orfèvres 8."]);
    let entities = structurer.structure_all(&input, BackendKind::Cnn).await.unwrap();

    // Equal-length overlap: the first match wins, so 1842 stays CARDINAL.
    assert_eq!(
        entities[0].annotated_text,
        "Roux, depuis <CARDINAL>1842</CARDINAL>, <LOC>quai des Orfèvres</LOC> <CARDINAL>8</CARDINAL>."
    );
    assert_eq!(entities[0].addresses, vec![address("quai des Orfèvres", &["8"])]);
    assert!(entities[0].persons.is_empty());
}

#[tokio::test]
async fn invalid_rule_file_makes_backend_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("broken.toml");
    std::fs::write(&rules, "[[rules]]\nlabel = \"LOC\"\npattern = \"(unclosed\"\n").unwrap();

    let mut config = NerConfig::default();
    config.cnn = PatternConfig {
        model_path: Some(rules),
    };
    let structurer = Structurer::new(&config);

    let err = structurer
        .structure(&texts(&["Roux"]), BackendKind::Cnn)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NerError::BackendUnavailable {
            backend: BackendKind::Cnn,
            ..
        }
    ));
}
