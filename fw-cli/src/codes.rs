use anyhow::{Context, Result, bail};
use fw_ir::{Brand, FirmwareVersion};
use fw_query::QueryRegistry;

pub fn run_codes(brand: Brand, firmware: &[String]) -> Result<()> {
    let registry = QueryRegistry::builtin();
    let config = registry.get(brand)?;
    if !config.supports_fuzzy() {
        bail!("brand '{brand}' has no platform-code extractor");
    }

    for raw in firmware {
        let fw = FirmwareVersion::parse_escaped(raw)
            .with_context(|| format!("decoding firmware string \"{raw}\""))?;
        let part_number = match config.find_part_number(fw.as_bytes()) {
            Some(true) => ", part number",
            _ => "",
        };
        match config.extract(fw.as_bytes()) {
            Some(code) => println!("{fw}: {code}{part_number}"),
            None => println!("{fw}: no platform code"),
        }
    }
    Ok(())
}
