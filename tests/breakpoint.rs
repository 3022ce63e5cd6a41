use fragstat_rs::breakpoint::{MateStatus, is_discordant};
use fragstat_rs::cigar::ClipType;
use fragstat_rs::config::{Config, Mode};
use fragstat_rs::record::{AlignmentRecord, AnnotatedRecord};
use fragstat_rs::types::Mate;
use noodles::sam::alignment::record::cigar::{op::Kind as CigarKind, Op as CigarOp};

fn chimeric_record(cigar: &[(CigarKind, usize)]) -> AlignmentRecord {
    AlignmentRecord {
        name: "chim1".to_string(),
        mate: Some(Mate::First),
        is_mapped: true,
        is_mate_mapped: true,
        is_primary: true,
        reference: Some("chr1".to_string()),
        start: 1000,
        cigar: cigar.iter().map(|&(kind, len)| CigarOp::new(kind, len)).collect(),
        md: Some("75".to_string()),
        multiplicity: Some(1),
        read_length: 100,
        mate_reference: Some("chr1".to_string()),
        mate_start: 1200,
        ..Default::default()
    }
}

fn annotate(record: AlignmentRecord, mode: Mode) -> AnnotatedRecord {
    AnnotatedRecord::annotate(record, &Config::new(mode, 100)).unwrap()
}

#[test]
fn head_clip_breaks_at_alignment_start() {
    let record = chimeric_record(&[(CigarKind::SoftClip, 25), (CigarKind::Match, 75)]);
    let bp = annotate(record, Mode::Paired).breakpoint.unwrap();
    assert_eq!(bp.position, 1000);
    assert_eq!(bp.mate_status, MateStatus::Proper);
    assert_eq!(bp.clip, ClipType::Soft);
    assert_eq!(bp.to_string(), "chr1\t1000\tchim1\tp\tS");
}

#[test]
fn tail_clip_breaks_after_last_block() {
    let mut record = chimeric_record(&[
        (CigarKind::Match, 30),
        (CigarKind::Skip, 500),
        (CigarKind::Match, 45),
        (CigarKind::HardClip, 25),
    ]);
    record.md = Some("75".to_string());
    let bp = annotate(record, Mode::Paired).breakpoint.unwrap();
    assert_eq!(bp.position, 1000 + 575);
    assert_eq!(bp.clip, ClipType::Hard);
}

#[test]
fn mate_on_other_reference_is_wrong() {
    let mut record = chimeric_record(&[(CigarKind::SoftClip, 25), (CigarKind::Match, 75)]);
    record.mate_reference = Some("chr2".to_string());
    let bp = annotate(record, Mode::Paired).breakpoint.unwrap();
    assert_eq!(bp.mate_status, MateStatus::Wrong);
}

#[test]
fn mate_distance_limit_is_inclusive() {
    let mut record = chimeric_record(&[(CigarKind::SoftClip, 25), (CigarKind::Match, 75)]);
    record.mate_start = 1000 + 230_000;
    let bp = annotate(record.clone(), Mode::Paired).breakpoint.unwrap();
    assert_eq!(bp.mate_status, MateStatus::Proper);

    record.mate_start += 1;
    let bp = annotate(record, Mode::Paired).breakpoint.unwrap();
    assert_eq!(bp.mate_status, MateStatus::Wrong);
}

#[test]
fn single_end_never_checks_the_mate() {
    let mut record = chimeric_record(&[(CigarKind::SoftClip, 25), (CigarKind::Match, 75)]);
    record.mate = None;
    record.mate_reference = Some("chr2".to_string());
    let bp = annotate(record, Mode::Single).breakpoint.unwrap();
    assert_eq!(bp.mate_status, MateStatus::Proper);
}

#[test]
fn multi_mapped_records_have_no_breakpoint() {
    let mut record = chimeric_record(&[(CigarKind::SoftClip, 25), (CigarKind::Match, 75)]);
    record.multiplicity = Some(3);
    assert!(annotate(record, Mode::Paired).breakpoint.is_none());
}

#[test]
fn unclipped_records_have_no_breakpoint() {
    let mut record = chimeric_record(&[(CigarKind::Match, 100)]);
    record.md = Some("100".to_string());
    assert!(annotate(record, Mode::Paired).breakpoint.is_none());
}

#[test]
fn discordance() {
    assert!(!is_discordant("chr1", 100, "chr1", 5000, 230_000));
    assert!(is_discordant("chr1", 100, "chr2", 100, 230_000));
    assert!(is_discordant("chr1", 300_000, "chr1", 100, 230_000));
}
