use fw_ir::*;
use fw_yaml::{YamlParseError, merge_databases, parse_database_yaml, parse_observed_yaml};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

const HYUNDAI: &str = include_str!("../../data/hyundai.yml");
const MAZDA: &str = include_str!("../../data/mazda.yml");
const TESLA: &str = include_str!("../../data/tesla.yml");

fn platform(name: &str) -> Platform {
    Platform::from(name)
}

#[test]
fn test_parse_hyundai_database() {
    let db = parse_database_yaml(HYUNDAI).unwrap();
    assert_eq!(db.len(), 18);
    assert_eq!(db.brands(), BTreeSet::from([Brand::Hyundai]));

    let camera = EcuIdentity::new(EcuRole::FwdCamera, 0x7c4, None);
    let record = db.get(&platform("HYUNDAI_GENESIS"), &camera).unwrap();
    assert!(record.contains(b"\xf1\x00DH LKAS 1.1 -150210"));
    assert_eq!(record.len(), 3);
}

#[test]
fn test_escaped_bytes_decode_to_single_bytes() {
    let db = parse_database_yaml(HYUNDAI).unwrap();
    let abs = EcuIdentity::new(EcuRole::Abs, 0x7d1, None);
    let record = db.get(&platform("HYUNDAI_GENESIS"), &abs).unwrap();
    let fw = record.iter().next().unwrap();
    assert_eq!(&fw.as_bytes()[..2], b"\xf1\x00");
    assert!(fw.as_bytes().contains(&0x11));
}

#[test]
fn test_flags_and_check_rules_loaded() {
    let db = parse_database_yaml(HYUNDAI).unwrap();
    let ev6 = db.flags_of(&platform("KIA_EV6")).unwrap();
    assert_eq!(ev6, &BTreeSet::from([PlatformFlag::CanFd, PlatformFlag::Ev]));

    let rules = db.check_rules(Brand::Hyundai).unwrap();
    assert_eq!(
        rules.ambiguous_platforms,
        BTreeSet::from([
            platform("GENESIS_G70"),
            platform("GENESIS_G70_2020"),
            platform("TUCSON_4TH_GEN"),
            platform("TUCSON_HYBRID_4TH_GEN"),
        ])
    );
    assert!(rules.is_code_ecu_exempt(EcuRole::Eps, &platform("IONIQ_5")));
    assert!(!rules.is_code_ecu_exempt(EcuRole::FwdRadar, &platform("IONIQ_5")));
    assert!(rules.part_number_exempt.contains(&platform("HYUNDAI_GENESIS")));
}

#[test]
fn test_merge_all_brand_files() {
    let db = merge_databases([
        parse_database_yaml(HYUNDAI).unwrap(),
        parse_database_yaml(MAZDA).unwrap(),
        parse_database_yaml(TESLA).unwrap(),
    ])
    .unwrap();
    assert_eq!(db.len(), 18 + 6 + 4);
    assert_eq!(db.brands().len(), 3);
    assert_eq!(db.brand_of(&platform("MAZDA_CX5")), Some(Brand::Mazda));
    assert!(db.check_rules(Brand::Mazda).is_none());
}

#[test]
fn test_merge_same_file_twice_fails() {
    let err = merge_databases([
        parse_database_yaml(MAZDA).unwrap(),
        parse_database_yaml(MAZDA).unwrap(),
    ])
    .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicatePlatform(_)));
}

#[test]
fn test_multi_document_file() {
    let yaml = format!("{MAZDA}\n---\n{TESLA}");
    let db = parse_database_yaml(&yaml).unwrap();
    assert_eq!(db.len(), 10);
}

#[test]
fn test_duplicate_identity_is_schema_error() {
    let yaml = r#"
schema: fwprint.firmware/v1
brand: mazda
platforms:
  MAZDA_X:
    ecus:
      - role: eps
        address: 0x730
        firmware: ["a"]
      - role: eps
        address: "0x730"
        firmware: ["b"]
"#;
    let err = parse_database_yaml(yaml).unwrap_err();
    assert!(matches!(
        err,
        YamlParseError::Schema(SchemaError::DuplicateIdentity { .. })
    ));
}

#[test]
fn test_empty_firmware_list_is_schema_error() {
    let yaml = r#"
schema: fwprint.firmware/v1
brand: tesla
platforms:
  TESLA_X:
    ecus:
      - role: eps
        address: 0x730
        firmware: []
"#;
    let err = parse_database_yaml(yaml).unwrap_err();
    assert!(matches!(
        err,
        YamlParseError::Schema(SchemaError::EmptyFirmware { .. })
    ));
}

#[test]
fn test_non_byte_character_is_rejected() {
    let yaml = "
schema: fwprint.firmware/v1
brand: tesla
platforms:
  TESLA_X:
    ecus:
      - role: eps
        address: 0x730
        firmware: [\"\u{2603}\"]
";
    match parse_database_yaml(yaml).unwrap_err() {
        YamlParseError::Schema(SchemaError::InvalidValue { path, .. }) => {
            assert_eq!(path, "platforms.TESLA_X.ecus[0].firmware[0]");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_role_and_flag_are_rejected() {
    let bad_role = r#"
brand: tesla
platforms:
  TESLA_X:
    ecus:
      - role: flux
        address: 1
        firmware: ["x"]
"#;
    assert!(matches!(
        parse_database_yaml(bad_role).unwrap_err(),
        YamlParseError::Schema(SchemaError::InvalidValue { .. })
    ));

    let bad_flag = r#"
brand: tesla
platforms:
  TESLA_X:
    flags: [warp]
    ecus:
      - role: eps
        address: 1
        firmware: ["x"]
"#;
    assert!(matches!(
        parse_database_yaml(bad_flag).unwrap_err(),
        YamlParseError::Schema(SchemaError::InvalidValue { .. })
    ));
}

#[test]
fn test_wrong_schema_id_is_rejected() {
    let yaml = "schema: other/v9\nbrand: tesla\nplatforms: {}\n";
    assert!(matches!(
        parse_database_yaml(yaml).unwrap_err(),
        YamlParseError::Schema(SchemaError::InvalidValue { .. })
    ));
}

#[test]
fn test_rules_naming_unknown_platform_fail() {
    let yaml = r#"
brand: mazda
checks:
  ambiguous_platforms: [MAZDA_GHOST]
platforms:
  MAZDA_X:
    ecus:
      - role: eps
        address: 0x730
        firmware: ["x"]
"#;
    assert!(matches!(
        parse_database_yaml(yaml).unwrap_err(),
        YamlParseError::Schema(SchemaError::UnknownPlatform(_))
    ));
}

#[test]
fn test_parse_observed_file() {
    let file = parse_observed_yaml(include_str!(
        "../../test-fixtures/observed/palisade-exact.yml"
    ))
    .unwrap();
    assert_eq!(file.brand, Some(Brand::Hyundai));
    assert_eq!(file.readings.len(), 4);
    assert!(file.readings[3].logging);

    let observed = file.to_observed();
    // the logging-only engine reading is dropped
    assert_eq!(observed.len(), 3);
    let radar = EcuIdentity::new(EcuRole::FwdRadar, 0x7d0, None);
    assert!(observed.get(&radar).is_some());
}

#[test]
fn test_observed_reading_brand_filter() {
    let yaml = r#"
brand: hyundai
firmware:
  - ecu: eps
    address: 0x730
    fw_version: "mazda eps"
    brand: mazda
  - ecu: fwdCamera
    address: 0x7c4
    sub_address: null
    fw_version: "camera"
"#;
    let file = parse_observed_yaml(yaml).unwrap();
    let observed = file.to_observed();
    assert_eq!(observed.len(), 1);
    assert!(
        observed
            .get(&EcuIdentity::new(EcuRole::FwdCamera, 0x7c4, None))
            .is_some()
    );
}
