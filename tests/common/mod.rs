#![allow(dead_code)]

use std::sync::Mutex;

use flate2::Compression;
use flate2::write::GzEncoder;

use sobs_sra_loader::app::{ProgressEvent, ProgressSink};

pub const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SAMPLE_SET>
  <SAMPLE alias="core-1" accession="SRS000001">
    <IDENTIFIERS><PRIMARY_ID>SRS000001</PRIMARY_ID></IDENTIFIERS>
    <TITLE>Forest soil core 1</TITLE>
    <SAMPLE_NAME>
      <TAXON_ID>410658</TAXON_ID>
      <SCIENTIFIC_NAME>soil metagenome</SCIENTIFIC_NAME>
    </SAMPLE_NAME>
    <SAMPLE_ATTRIBUTES>
      <SAMPLE_ATTRIBUTE><TAG>lat_lon</TAG><VALUE>45.5 N, 73.6 W</VALUE></SAMPLE_ATTRIBUTE>
      <SAMPLE_ATTRIBUTE><TAG>geo_loc_name</TAG><VALUE>Canada: Montreal</VALUE></SAMPLE_ATTRIBUTE>
      <SAMPLE_ATTRIBUTE><TAG>env.biome</TAG><VALUE>temperate forest</VALUE></SAMPLE_ATTRIBUTE>
      <SAMPLE_ATTRIBUTE><TAG>note</TAG></SAMPLE_ATTRIBUTE>
      <SAMPLE_ATTRIBUTE><TAG>note</TAG><VALUE>resampled</VALUE></SAMPLE_ATTRIBUTE>
    </SAMPLE_ATTRIBUTES>
  </SAMPLE>
  <SAMPLE alias="core-2" accession="SRS000002">
    <SAMPLE_NAME>
      <TAXON_ID>410658</TAXON_ID>
      <SCIENTIFIC_NAME>soil metagenome</SCIENTIFIC_NAME>
    </SAMPLE_NAME>
    <SAMPLE_ATTRIBUTES>
      <SAMPLE_ATTRIBUTE><TAG>lat_lon</TAG><VALUE>not applicable</VALUE></SAMPLE_ATTRIBUTE>
    </SAMPLE_ATTRIBUTES>
  </SAMPLE>
  <SAMPLE alias="gut-1" accession="SRS000003">
    <SAMPLE_NAME>
      <TAXON_ID>749906</TAXON_ID>
      <SCIENTIFIC_NAME>gut metagenome</SCIENTIFIC_NAME>
    </SAMPLE_NAME>
    <SAMPLE_ATTRIBUTES>
      <SAMPLE_ATTRIBUTE><TAG>lat_lon</TAG><VALUE>12.0 S 77.0 W</VALUE></SAMPLE_ATTRIBUTE>
    </SAMPLE_ATTRIBUTES>
  </SAMPLE>
</SAMPLE_SET>
"#;

pub const EXPERIMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<EXPERIMENT_SET>
  <EXPERIMENT alias="exp-1" accession="SRX000001">
    <TITLE>16S survey</TITLE>
    <STUDY_REF accession="SRP000001"/>
    <DESIGN>
      <DESIGN_DESCRIPTION>V4 amplicons</DESIGN_DESCRIPTION>
      <SAMPLE_DESCRIPTOR accession="SRS000001">
        <IDENTIFIERS><PRIMARY_ID>SRS000001</PRIMARY_ID></IDENTIFIERS>
      </SAMPLE_DESCRIPTOR>
      <LIBRARY_DESCRIPTOR>
        <LIBRARY_NAME>core-1-v4</LIBRARY_NAME>
        <LIBRARY_STRATEGY>AMPLICON</LIBRARY_STRATEGY>
        <LIBRARY_SOURCE>METAGENOMIC</LIBRARY_SOURCE>
        <LIBRARY_SELECTION>PCR</LIBRARY_SELECTION>
        <LIBRARY_LAYOUT><PAIRED NOMINAL_LENGTH="300"/></LIBRARY_LAYOUT>
      </LIBRARY_DESCRIPTOR>
    </DESIGN>
    <PLATFORM><ILLUMINA><INSTRUMENT_MODEL>Illumina MiSeq</INSTRUMENT_MODEL></ILLUMINA></PLATFORM>
  </EXPERIMENT>
  <EXPERIMENT alias="exp-2" accession="SRX000002">
    <DESIGN>
      <DESIGN_DESCRIPTION></DESIGN_DESCRIPTION>
      <SAMPLE_DESCRIPTOR accession="SRS000002">
        <IDENTIFIERS><PRIMARY_ID>SRS000002</PRIMARY_ID></IDENTIFIERS>
      </SAMPLE_DESCRIPTOR>
      <LIBRARY_DESCRIPTOR>
        <LIBRARY_STRATEGY>WGS</LIBRARY_STRATEGY>
        <LIBRARY_SOURCE>METAGENOMIC</LIBRARY_SOURCE>
        <LIBRARY_SELECTION>RANDOM</LIBRARY_SELECTION>
        <LIBRARY_LAYOUT><SINGLE/></LIBRARY_LAYOUT>
      </LIBRARY_DESCRIPTOR>
    </DESIGN>
    <PLATFORM><ION_TORRENT><INSTRUMENT_MODEL>Ion Torrent PGM</INSTRUMENT_MODEL></ION_TORRENT></PLATFORM>
  </EXPERIMENT>
  <EXPERIMENT alias="exp-3" accession="SRX000003">
    <DESIGN>
      <SAMPLE_DESCRIPTOR accession="SRS000003">
        <IDENTIFIERS><PRIMARY_ID>SRS000003</PRIMARY_ID></IDENTIFIERS>
      </SAMPLE_DESCRIPTOR>
      <LIBRARY_DESCRIPTOR>
        <LIBRARY_LAYOUT><SINGLE/></LIBRARY_LAYOUT>
      </LIBRARY_DESCRIPTOR>
    </DESIGN>
    <PLATFORM><ILLUMINA><INSTRUMENT_MODEL>Illumina HiSeq 2500</INSTRUMENT_MODEL></ILLUMINA></PLATFORM>
  </EXPERIMENT>
</EXPERIMENT_SET>
"#;

pub const RUN_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<RUN_SET>
  <RUN alias="run-1" accession="SRR000001">
    <TITLE>MiSeq run 1</TITLE>
    <EXPERIMENT_REF accession="SRX000001"/>
  </RUN>
  <RUN alias="run-2" accession="SRR000002">
    <EXPERIMENT_REF accession="SRX000002"/>
  </RUN>
</RUN_SET>
"#;

pub const SUBMISSION_XML: &str = r#"<SUBMISSION_SET><SUBMISSION accession="SRA000001"/></SUBMISSION_SET>"#;

/// Members of a small but complete metadata archive, in archive order.
pub fn fixture_members() -> Vec<(&'static str, Option<&'static str>)> {
    vec![
        ("SRA000001/", None),
        ("SRA000001/SRA000001.submission.xml", Some(SUBMISSION_XML)),
        ("SRA000001/SRA000001.experiment.xml", Some(EXPERIMENT_XML)),
        ("SRA000001/SRA000001.sample.xml", Some(SAMPLE_XML)),
        ("SRA000001/SRA000001.run.xml", Some(RUN_XML)),
    ]
}

/// Builds a `.tar.gz` in memory; `None` content makes a directory entry.
pub fn archive_bytes(members: &[(&str, Option<&str>)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in members {
        let mut header = tar::Header::new_gnu();
        match content {
            Some(body) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(body.len() as u64);
                builder
                    .append_data(&mut header, name, body.as_bytes())
                    .unwrap();
            }
            None => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder
                    .append_data(&mut header, name, std::io::empty())
                    .unwrap();
            }
        }
    }
    builder.into_inner().unwrap().finish().unwrap()
}

#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.messages.lock().unwrap().push(event.message);
    }
}
