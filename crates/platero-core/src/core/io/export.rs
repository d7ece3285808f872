use crate::core::interaction::{Crosstab, InteractionRecord};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct InteractionRow<'a> {
    #[serde(rename = "Bait")]
    bait: &'a str,
    #[serde(rename = "Prey")]
    prey: &'a str,
    #[serde(rename = "Normalized")]
    normalized: Option<f64>,
    #[serde(rename = "Value")]
    value: f64,
    #[serde(rename = "NC")]
    control_mean: Option<f64>,
    #[serde(rename = "Z_Score")]
    z_score: Option<f64>,
    #[serde(rename = "Z_Score_Plate")]
    z_score_plate: Option<f64>,
    #[serde(rename = "Plate")]
    plate: u32,
    #[serde(rename = "PlateCell")]
    plate_cell: String,
    #[serde(rename = "BaitId")]
    bait_id: &'a str,
    #[serde(rename = "BaitFamily")]
    bait_family: &'a str,
    #[serde(rename = "BaitSubfamily")]
    bait_subfamily: &'a str,
    #[serde(rename = "PreyId")]
    prey_id: &'a str,
    #[serde(rename = "PreyFamily")]
    prey_family: &'a str,
    #[serde(rename = "PreySubfamily")]
    prey_subfamily: &'a str,
    #[serde(rename = "InteractionId")]
    interaction_id: String,
}

impl<'a> From<&'a InteractionRecord> for InteractionRow<'a> {
    fn from(record: &'a InteractionRecord) -> Self {
        Self {
            bait: &record.bait.label,
            prey: &record.prey.label,
            normalized: record.normalized_value,
            value: record.raw_value,
            control_mean: record.control_mean,
            z_score: record.z_score_global,
            z_score_plate: record.z_score_plate,
            plate: record.plate_id,
            plate_cell: record.plate_cell.to_string(),
            bait_id: record.bait.id.as_str(),
            bait_family: &record.bait.family,
            bait_subfamily: &record.bait.subfamily,
            prey_id: record.prey.id.as_str(),
            prey_family: &record.prey.family,
            prey_subfamily: &record.prey.subfamily,
            interaction_id: record.key().to_string(),
        }
    }
}

/// Writes one row per record with every derived value.
pub fn write_interactions(records: &[InteractionRecord], writer: impl Write) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(InteractionRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes a crosstab: three header lines for the bait axis, then one line per prey.
pub fn write_crosstab(crosstab: &Crosstab, writer: impl Write) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);

    let header = |first: &str, second: &str, third: &str, values: Vec<&str>| {
        let mut record = vec![first.to_string(), second.to_string(), third.to_string()];
        record.extend(values.into_iter().map(str::to_string));
        record
    };
    let columns = &crosstab.columns;
    csv_writer.write_record(header(
        "",
        "",
        "BaitFamily",
        columns.iter().map(|c| c.family.as_str()).collect(),
    ))?;
    csv_writer.write_record(header(
        "",
        "",
        "BaitSubfamily",
        columns.iter().map(|c| c.subfamily.as_str()).collect(),
    ))?;
    csv_writer.write_record(header(
        "PreyFamily",
        "PreySubfamily",
        "Prey vs Bait",
        columns.iter().map(|c| c.label.as_str()).collect(),
    ))?;

    for (prey, values) in crosstab.rows.iter().zip(&crosstab.values) {
        let mut record = vec![prey.family.clone(), prey.subfamily.clone(), prey.label.clone()];
        record.extend(values.iter().map(f64::to_string));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interaction::ProteinKey;
    use crate::core::protein::ProteinRef;

    fn protein(id: &str, label: &str, family: &str) -> ProteinRef {
        ProteinRef {
            label: label.to_string(),
            family: family.to_string(),
            subfamily: format!("{}-a", family),
            nickname: String::new(),
            ..ProteinRef::with_id(id)
        }
    }

    #[test]
    fn interaction_table_has_the_documented_columns() {
        let mut record = InteractionRecord::new(
            3,
            "B7".parse().unwrap(),
            protein("AT1G00001", "NAC1", "NAC"),
            protein("AT2G00002", "ARF2", "ARF"),
            20.0,
        );
        record.control_mean = Some(10.0);
        record.normalized_value = Some(2.0);
        record.z_score_plate = Some(1.5);

        let mut buffer = Vec::new();
        write_interactions(&[record], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Bait,Prey,Normalized,Value,NC,Z_Score,Z_Score_Plate,Plate,PlateCell,BaitId,\
             BaitFamily,BaitSubfamily,PreyId,PreyFamily,PreySubfamily,InteractionId"
        );
        assert_eq!(
            lines[1],
            "NAC1,ARF2,2.0,20.0,10.0,,1.5,3,B7,AT1G00001,NAC,NAC-a,AT2G00002,ARF,ARF-a,\
             AT1G00001 x AT2G00002"
        );
    }

    #[test]
    fn crosstab_lists_bait_headers_then_prey_rows() {
        let key = |family: &str, label: &str| ProteinKey {
            family: family.to_string(),
            subfamily: format!("{}-a", family),
            label: label.to_string(),
        };
        let crosstab = Crosstab {
            rows: vec![key("ARF", "ARF2")],
            columns: vec![key("NAC", "NAC1"), key("NAC", "NAC3")],
            values: vec![vec![2.0, 0.0]],
            missing: 1,
        };

        let mut buffer = Vec::new();
        write_crosstab(&crosstab, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], ",,BaitFamily,NAC,NAC");
        assert_eq!(lines[1], ",,BaitSubfamily,NAC-a,NAC-a");
        assert_eq!(lines[2], "PreyFamily,PreySubfamily,Prey vs Bait,NAC1,NAC3");
        assert_eq!(lines[3], "ARF,ARF-a,ARF2,2,0");
    }
}
