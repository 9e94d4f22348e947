use dmxp_slotbuffer::payload::{
    Course, PayloadSink, PayloadSource, RecordError, ReportSink, StudentRecord, StudentSource,
    PASS_MARK,
};

// Pretty-printed document with an XML declaration and no checksum attribute
const PLAIN_XML: &str = r#"<?xml version="1.0" ?>
<student>
  <name>Sipho Dlamini</name>
  <student_id>20231234</student_id>
  <programme>BSc Computer Science</programme>
  <courses>
    <course>
      <course_name>Programming I</course_name>
      <mark>77</mark>
    </course>
    <course>
      <course_name>Operating Systems</course_name>
      <mark>45</mark>
    </course>
  </courses>
</student>
"#;

fn sample() -> StudentRecord {
    StudentRecord::new(
        "Thandi Nkosi",
        "20231234",
        "BSc Data Science",
        vec![
            Course::new("Programming I", 72),
            Course::new("Database Systems", 48),
            Course::new("Computer Networks", 60),
            Course::new("Operating Systems", 40),
        ],
    )
}

#[test]
fn encoded_record_is_student_xml() {
    let xml = sample().encode().unwrap();
    assert!(xml.starts_with("<student checksum=\""));
    assert!(xml.contains("<name>Thandi Nkosi</name>"));
    assert!(xml.contains("<course><course_name>Programming I</course_name><mark>72</mark></course>"));
    assert!(xml.ends_with("</student>"));

    let decoded = StudentRecord::decode(xml.as_bytes()).unwrap();
    assert_eq!(decoded, sample());
    assert!(decoded.checksum.is_none());
}

#[test]
fn plain_xml_document_is_accepted() {
    let record = StudentRecord::decode(PLAIN_XML.as_bytes()).unwrap();
    assert_eq!(record.name, "Sipho Dlamini");
    assert_eq!(record.student_id, "20231234");
    assert_eq!(
        record.courses,
        vec![Course::new("Programming I", 77), Course::new("Operating Systems", 45)]
    );
    assert!((record.average() - 61.0).abs() < f64::EPSILON);

    let mut sink = ReportSink::quiet();
    sink.deliver(1, PLAIN_XML.as_bytes());
    assert_eq!(sink.accepted, vec![1]);
    assert!(sink.rejected.is_empty());
}

#[test]
fn tampered_record_fails_checksum() {
    let xml = sample().encode().unwrap();
    let tampered = xml.replace("<mark>40</mark>", "<mark>90</mark>");
    assert_ne!(tampered, xml);
    assert_eq!(
        StudentRecord::decode(tampered.as_bytes()),
        Err(RecordError::ChecksumMismatch)
    );
}

#[test]
fn decode_rejects_garbage() {
    assert_eq!(StudentRecord::decode(&[0xff, 0x00]), Err(RecordError::NotUtf8));
    assert!(matches!(
        StudentRecord::decode(b"name: nobody\n"),
        Err(RecordError::Xml(_))
    ));
    assert!(matches!(
        StudentRecord::decode(b"<student><name>No Id</name></student>"),
        Err(RecordError::Xml(_))
    ));
}

#[test]
fn average_and_pass_mark() {
    let record = sample();
    assert!((record.average() - 55.0).abs() < f64::EPSILON);
    assert!(record.passed());

    let failing = StudentRecord {
        courses: vec![Course::new("Programming I", 30), Course::new("Data Structures", 49)],
        ..sample()
    };
    assert!(failing.average() < PASS_MARK);
    assert!(!failing.passed());

    let report = failing.render_report();
    assert!(report.contains("Average Mark: 39.50"));
    assert!(report.contains("Status: FAIL"));
}

#[test]
fn random_records_stay_in_range() {
    let mut rng = fastrand::Rng::with_seed(42);
    for _ in 0..50 {
        let record = StudentRecord::random(&mut rng);
        assert!((4..=6).contains(&record.courses.len()));
        assert!(record.courses.iter().all(|c| (30..=100).contains(&c.mark)));
        assert_eq!(record.student_id.len(), 8);

        let mut names: Vec<&str> = record.courses.iter().map(|c| c.course_name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), record.courses.len());
    }
}

#[test]
fn student_source_emits_xml() {
    let mut source = StudentSource::with_seed(3);
    let payload = source.generate(1);
    assert!(payload.starts_with(b"<student"));
    assert!(StudentRecord::decode(&payload).is_ok());
}

#[test]
fn seeded_sources_are_deterministic() {
    let mut a = StudentSource::with_seed(9);
    let mut b = StudentSource::with_seed(9);
    for token in 1..=5 {
        assert_eq!(a.generate(token), b.generate(token));
    }
}

#[test]
fn report_sink_sorts_payloads() {
    let mut sink = ReportSink::quiet();
    sink.deliver(1, sample().encode().unwrap().as_bytes());
    sink.deliver(2, b"not a record");
    sink.deliver(3, &StudentSource::with_seed(1).generate(3));

    assert_eq!(sink.accepted, vec![1, 3]);
    assert_eq!(sink.rejected, vec![2]);
}
