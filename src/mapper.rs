use std::collections::BTreeSet;

use crate::domain::{Attributes, Experiment, Record, RecordKind, Run, Sample};
use crate::error::SobsError;
use crate::xml::Element;

pub type Mapped<T> = Result<(String, T), SobsError>;

pub fn samples(root: &Element) -> impl Iterator<Item = Mapped<Sample>> + '_ {
    record_elements(root, RecordKind::Sample).map(map_sample)
}

pub fn experiments(root: &Element) -> impl Iterator<Item = Mapped<Experiment>> + '_ {
    record_elements(root, RecordKind::Experiment).map(map_experiment)
}

pub fn runs(root: &Element) -> impl Iterator<Item = Mapped<Run>> + '_ {
    record_elements(root, RecordKind::Run).map(map_run)
}

pub fn records(
    kind: RecordKind,
    root: &Element,
) -> Box<dyn Iterator<Item = Result<Record, SobsError>> + '_> {
    match kind {
        RecordKind::Sample => Box::new(samples(root).map(|item| item.map(Record::from))),
        RecordKind::Experiment => Box::new(experiments(root).map(|item| item.map(Record::from))),
        RecordKind::Run => Box::new(runs(root).map(|item| item.map(Record::from))),
    }
}

// A document whose root is itself a record element yields that one record.
fn record_elements(root: &Element, kind: RecordKind) -> impl Iterator<Item = &Element> {
    let name = kind.element_name();
    let elements = if root.tag() == name {
        vec![root]
    } else {
        root.find_all(name)
    };
    elements.into_iter()
}

fn map_sample(sample: &Element) -> Mapped<Sample> {
    let accession = sample.require_attribute("accession")?.to_string();

    let (taxid, scientific_name) = match taxonomy(sample) {
        Some((taxid, scientific_name)) => (Some(taxid), scientific_name),
        None => (None, None),
    };

    let mut attributes = Attributes::new();
    for attribute in sample.find_all("SAMPLE_ATTRIBUTES/SAMPLE_ATTRIBUTE") {
        let tags = attribute.find_all("TAG");
        let [tag] = tags.as_slice() else {
            return Err(shape(
                RecordKind::Sample,
                &accession,
                format!("SAMPLE_ATTRIBUTE has {} TAG elements", tags.len()),
            ));
        };

        let values = attribute.find_all("VALUE");
        let value = match values.as_slice() {
            [] => None,
            [value] => value.text().map(str::to_string),
            _ => {
                return Err(shape(
                    RecordKind::Sample,
                    &accession,
                    format!("SAMPLE_ATTRIBUTE has {} VALUE elements", values.len()),
                ));
            }
        };

        let Some(tag) = tag.text() else {
            continue;
        };
        attributes
            .entry(tag.replace('.', "_"))
            .or_default()
            .push(value);
    }

    Ok((
        accession,
        Sample {
            taxid,
            scientific_name,
            attributes,
        },
    ))
}

// Any failure here means "not present" for both fields.
fn taxonomy(sample: &Element) -> Option<(i64, Option<String>)> {
    let taxid = sample
        .at_most_one("SAMPLE_NAME/TAXON_ID")
        .ok()??
        .trim()
        .parse()
        .ok()?;
    let scientific_name = sample.at_most_one("SAMPLE_NAME/SCIENTIFIC_NAME").ok()?;
    Some((taxid, scientific_name))
}

fn map_experiment(experiment: &Element) -> Mapped<Experiment> {
    let accession = experiment.require_attribute("accession")?.to_string();
    let fail = |message: &str| shape(RecordKind::Experiment, &accession, message.to_string());

    let layout = experiment
        .find("DESIGN/LIBRARY_DESCRIPTOR/LIBRARY_LAYOUT")
        .ok_or_else(|| fail("missing DESIGN/LIBRARY_DESCRIPTOR/LIBRARY_LAYOUT"))?;
    let layouts: BTreeSet<&str> = layout.children().iter().map(Element::tag).collect();
    let library_layout = match layouts.into_iter().collect::<Vec<_>>().as_slice() {
        [single] => single.to_string(),
        other => {
            return Err(fail(&format!(
                "LIBRARY_LAYOUT must name exactly one layout, found {other:?}"
            )));
        }
    };

    let platform = experiment
        .find("PLATFORM")
        .ok_or_else(|| fail("missing PLATFORM"))?;
    let platform_type = platform
        .iter()
        .nth(1)
        .map(|node| node.tag().to_string())
        .ok_or_else(|| fail("PLATFORM has no platform element"))?;
    let instrument = platform
        .find("*/INSTRUMENT_MODEL")
        .ok_or_else(|| fail("missing PLATFORM/*/INSTRUMENT_MODEL"))?;

    let experiment_data = Experiment {
        sample_accession: experiment
            .at_most_one("DESIGN/SAMPLE_DESCRIPTOR/IDENTIFIERS/PRIMARY_ID")?,
        description: experiment.at_most_one("DESIGN/DESIGN_DESCRIPTION")?,
        library_name: experiment.at_most_one("DESIGN/LIBRARY_DESCRIPTOR/LIBRARY_NAME")?,
        library_strategy: experiment.at_most_one("DESIGN/LIBRARY_DESCRIPTOR/LIBRARY_STRATEGY")?,
        library_source: experiment.at_most_one("DESIGN/LIBRARY_DESCRIPTOR/LIBRARY_SOURCE")?,
        library_selection: experiment
            .at_most_one("DESIGN/LIBRARY_DESCRIPTOR/LIBRARY_SELECTION")?,
        library_layout,
        platform_type,
        platform_instrument_model: instrument.text().map(str::to_string),
    };

    Ok((accession, experiment_data))
}

fn map_run(run: &Element) -> Mapped<Run> {
    let accession = run.require_attribute("accession")?.to_string();

    let refs = run.find_all("EXPERIMENT_REF");
    let [experiment_ref] = refs.as_slice() else {
        return Err(shape(
            RecordKind::Run,
            &accession,
            format!("expected one EXPERIMENT_REF, found {}", refs.len()),
        ));
    };
    let experiment_accession = experiment_ref.require_attribute("accession")?.to_string();
    let title = run.at_most_one("TITLE")?;

    Ok((
        accession,
        Run {
            experiment_accession,
            title,
        },
    ))
}

fn shape(kind: RecordKind, accession: &str, message: String) -> SobsError {
    SobsError::FieldShape {
        record: kind.to_string(),
        accession: accession.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    #[test]
    fn single_record_root_is_mapped() {
        let doc = r#"<RUN accession="SRR1"><EXPERIMENT_REF accession="SRX1"/></RUN>"#;
        let root = xml::parse("run.xml", doc.as_bytes()).unwrap();
        let mapped: Vec<_> = runs(&root).collect::<Result<_, _>>().unwrap();
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].0, "SRR1");
    }

    #[test]
    fn taxonomy_survives_missing_name() {
        let doc = r#"<SAMPLE_SET><SAMPLE accession="SRS1">
            <SAMPLE_NAME><TAXON_ID> 9606 </TAXON_ID></SAMPLE_NAME>
        </SAMPLE></SAMPLE_SET>"#;
        let root = xml::parse("sample.xml", doc.as_bytes()).unwrap();
        let (_, sample) = samples(&root).next().unwrap().unwrap();
        assert_eq!(sample.taxid, Some(9606));
        assert_eq!(sample.scientific_name, None);
    }

    #[test]
    fn unparsable_taxid_clears_both_fields() {
        let doc = r#"<SAMPLE_SET><SAMPLE accession="SRS1">
            <SAMPLE_NAME><TAXON_ID>unknown</TAXON_ID><SCIENTIFIC_NAME>soil</SCIENTIFIC_NAME></SAMPLE_NAME>
        </SAMPLE></SAMPLE_SET>"#;
        let root = xml::parse("sample.xml", doc.as_bytes()).unwrap();
        let (_, sample) = samples(&root).next().unwrap().unwrap();
        assert_eq!(sample.taxid, None);
        assert_eq!(sample.scientific_name, None);
    }
}
