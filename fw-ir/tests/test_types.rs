use fw_ir::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn sample_db() -> FirmwareDatabase {
    let mut b = DatabaseBuilder::new();
    let cx5 = Platform::from("MAZDA_CX5");
    let ev6 = Platform::from("KIA_EV6");
    b.add_platform(cx5.clone(), Brand::Mazda, []).unwrap();
    b.add_platform(ev6.clone(), Brand::Hyundai, [PlatformFlag::CanFd, PlatformFlag::Ev])
        .unwrap();
    b.add_firmware(
        &cx5,
        EcuIdentity::new(EcuRole::Eps, 0x730, None),
        [FirmwareVersion::from(b"K319-3210X-A-00\x00\x00")],
    )
    .unwrap();
    b.add_firmware(
        &cx5,
        EcuIdentity::new(EcuRole::Engine, 0x7e0, None),
        [
            FirmwareVersion::from(b"PA53-188K2-A\x00"),
            FirmwareVersion::from(b"PAR4-188K2-E\x00"),
        ],
    )
    .unwrap();
    b.add_firmware(
        &ev6,
        EcuIdentity::new(EcuRole::FwdCamera, 0x7c4, None),
        [FirmwareVersion::from(
            b"\xf1\x00CV1 MFC  AT USA LHD 1.00 1.05 99210-CV000 211027",
        )],
    )
    .unwrap();
    b.build().unwrap()
}

#[test]
fn test_brand_and_role_names_roundtrip() {
    for brand in Brand::ALL {
        assert_eq!(brand.as_str().parse::<Brand>().unwrap(), brand);
    }
    for role in EcuRole::ALL {
        assert_eq!(role.as_str().parse::<EcuRole>().unwrap(), role);
    }
    assert_eq!("HYUNDAI".parse::<Brand>().unwrap(), Brand::Hyundai);
    assert!("fwdradar".parse::<EcuRole>().is_err());
    assert!("toyota".parse::<Brand>().is_err());
}

#[test]
fn test_identity_display() {
    let id = EcuIdentity::new(EcuRole::FwdRadar, 0x7d0, None);
    assert_eq!(id.to_string(), "fwdRadar@0x7d0");
    let id = EcuIdentity::new(EcuRole::Engine, 0x7e0, Some(0x0f));
    assert_eq!(id.to_string(), "engine@0x7e0.0x0f");
}

#[test]
fn test_identity_ordering_is_role_then_address() {
    let mut ids = vec![
        EcuIdentity::new(EcuRole::FwdRadar, 0x700, None),
        EcuIdentity::new(EcuRole::Engine, 0x7e0, Some(1)),
        EcuIdentity::new(EcuRole::Engine, 0x7e0, None),
    ];
    ids.sort();
    assert_eq!(ids[0], EcuIdentity::new(EcuRole::Engine, 0x7e0, None));
    assert_eq!(ids[2].role, EcuRole::FwdRadar);
}

#[test]
fn test_firmware_latin1_roundtrip() {
    let fw = FirmwareVersion::from(b"\xf1\x00DH LKAS 1.1 -150210");
    let text = fw.to_latin1();
    assert_eq!(text.chars().next(), Some('\u{f1}'));
    assert_eq!(FirmwareVersion::from_latin1(&text).unwrap(), fw);
    assert!(FirmwareVersion::from_latin1("snowman \u{2603}").is_none());
}

#[test]
fn test_firmware_escape_roundtrip() {
    let fw = FirmwareVersion::from(b"\xf1\x00AEhe SCC \"H-CUP\"\x00\\");
    let escaped = fw.to_string();
    assert_eq!(FirmwareVersion::parse_escaped(&escaped).unwrap(), fw);
    assert_eq!(format!("{fw:?}"), format!("b\"{escaped}\""));
}

#[test]
fn test_parse_escaped_errors() {
    assert_eq!(
        FirmwareVersion::parse_escaped("\\x1").unwrap_err(),
        EscapeError::ShortHex("1".into())
    );
    assert_eq!(
        FirmwareVersion::parse_escaped("\\xzz").unwrap_err(),
        EscapeError::BadHex("zz".into())
    );
    assert_eq!(
        FirmwareVersion::parse_escaped("abc\\").unwrap_err(),
        EscapeError::TrailingBackslash
    );
    assert_eq!(
        FirmwareVersion::parse_escaped("\\q").unwrap_err(),
        EscapeError::UnknownEscape('q')
    );
}

#[test]
fn test_parse_escaped_requires_two_hex_digits() {
    assert_eq!(
        FirmwareVersion::parse_escaped("\\x+1").unwrap_err(),
        EscapeError::BadHex("+1".into())
    );
    assert_eq!(
        FirmwareVersion::parse_escaped("\\x-f").unwrap_err(),
        EscapeError::BadHex("-f".into())
    );
    assert_eq!(
        FirmwareVersion::parse_escaped("\\x\u{e9}1").unwrap_err(),
        EscapeError::BadHex("\u{e9}1".into())
    );
    assert_eq!(
        FirmwareVersion::parse_escaped("\\xF1\\x00").unwrap(),
        FirmwareVersion::from(b"\xf1\x00")
    );
}

#[test]
fn test_legacy_can_flags() {
    assert!(!PlatformFlag::CanFd.is_legacy_can_only());
    assert!(!PlatformFlag::Ev.is_legacy_can_only());
    assert!(PlatformFlag::ChecksumCrc8.is_legacy_can_only());
    assert!(PlatformFlag::CameraScc.is_legacy_can_only());
}

#[test]
fn test_database_lookups() {
    let db = sample_db();
    let cx5 = Platform::from("MAZDA_CX5");
    let eps = EcuIdentity::new(EcuRole::Eps, 0x730, None);

    assert_eq!(db.len(), 2);
    assert_eq!(db.firmware_count(), 4);
    assert!(db.get(&cx5, &eps).unwrap().contains(b"K319-3210X-A-00\x00\x00"));
    assert!(!db.get(&cx5, &eps).unwrap().contains(b"K319-3210X-A-00"));
    assert!(db.get(&cx5, &EcuIdentity::new(EcuRole::Eps, 0x731, None)).is_none());
    assert_eq!(db.ecus_for(&cx5).len(), 2);
    assert!(db.ecus_for(&Platform::from("NOPE")).is_empty());
    assert_eq!(db.brand_of(&cx5), Some(Brand::Mazda));
    assert_eq!(
        db.brands(),
        BTreeSet::from([Brand::Hyundai, Brand::Mazda])
    );

    let hyundai: Vec<&Platform> = db.platforms_for(Brand::Hyundai).map(|(p, _)| p).collect();
    assert_eq!(hyundai, vec![&Platform::from("KIA_EV6")]);
    assert!(
        db.entry(&Platform::from("KIA_EV6"))
            .unwrap()
            .has_flag(PlatformFlag::CanFd)
    );
}

#[test]
fn test_merge_rejects_duplicate_platform() {
    let mut b = DatabaseBuilder::new();
    b.extend(sample_db()).unwrap();
    let err = b.extend(sample_db()).unwrap_err();
    assert!(matches!(err, SchemaError::DuplicatePlatform(_)));
}

#[test]
fn test_observed_from_entry_contains_every_version() {
    let db = sample_db();
    let entry = db.entry(&Platform::from("MAZDA_CX5")).unwrap();
    let observed = ObservedFirmware::from_entry(entry);
    assert_eq!(observed.len(), 2);
    let engine = EcuIdentity::new(EcuRole::Engine, 0x7e0, None);
    assert_eq!(observed.get(&engine).unwrap().len(), 2);
}
