/// End-to-end tests: write small name-sorted BAMs with noodles, run the
/// fragstat-rs binary on them and check every output file.
use noodles::bam;
use noodles::core::Position;
use noodles::sam;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::{op::Kind, Op};
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{Cigar, Sequence};
use noodles::sam::header::record::value::{Map, map::ReferenceSequence};
use std::fs::{self, File};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// ── helpers ──────────────────────────────────────────────────────────────────

fn header() -> sam::Header {
    let length = NonZeroUsize::new(1_000_000).expect("non-zero");
    sam::Header::builder()
        .add_reference_sequence("chr1", Map::<ReferenceSequence>::new(length))
        .add_reference_sequence("chr2", Map::<ReferenceSequence>::new(length))
        .build()
}

struct Rec<'a> {
    name: &'a str,
    flags: Flags,
    /// (reference id, 1-based start)
    at: Option<(usize, usize)>,
    mate_at: Option<(usize, usize)>,
    cigar: &'a [(Kind, usize)],
    md: Option<&'a str>,
    nh: Option<u8>,
}

impl Rec<'_> {
    fn build(&self) -> RecordBuf {
        let read_len: usize = if self.cigar.is_empty() {
            100
        } else {
            self.cigar.iter().filter(|(k, _)| k.consumes_read()).map(|(_, l)| l).sum()
        };
        let mut builder = RecordBuf::builder()
            .set_name(self.name)
            .set_flags(self.flags)
            .set_sequence(Sequence::from(vec![b'A'; read_len]))
            .set_cigar(Cigar::from(
                self.cigar.iter().map(|&(kind, len)| Op::new(kind, len)).collect::<Vec<_>>(),
            ));
        if let Some((id, start)) = self.at {
            builder = builder
                .set_reference_sequence_id(id)
                .set_alignment_start(Position::try_from(start).expect("position"));
        }
        if let Some((id, start)) = self.mate_at {
            builder = builder
                .set_mate_reference_sequence_id(id)
                .set_mate_alignment_start(Position::try_from(start).expect("position"));
        }
        let mut record = builder.build();
        if let Some(md) = self.md {
            record.data_mut().insert(Tag::new(b'M', b'D'), Value::from(md));
        }
        if let Some(nh) = self.nh {
            record.data_mut().insert(Tag::new(b'N', b'H'), Value::from(nh));
        }
        record
    }
}

const M100: &[(Kind, usize)] = &[(Kind::Match, 100)];

fn mapped<'a>(name: &'a str, flags: Flags, at: (usize, usize), mate_at: (usize, usize)) -> Rec<'a> {
    Rec {
        name,
        flags: Flags::SEGMENTED | flags,
        at: Some(at),
        mate_at: Some(mate_at),
        cigar: M100,
        md: Some("100"),
        nh: Some(1),
    }
}

fn unmapped(name: &str, flags: Flags) -> Rec<'_> {
    Rec {
        name,
        flags: Flags::SEGMENTED | Flags::UNMAPPED | flags,
        at: None,
        mate_at: None,
        cigar: &[],
        md: None,
        nh: None,
    }
}

fn write_bam(path: &Path, records: &[Rec<'_>]) {
    let header = header();
    let mut writer = bam::io::Writer::new(File::create(path).expect("create BAM"));
    writer.write_header(&header).expect("write header");
    for rec in records {
        writer.write_alignment_record(&header, &rec.build()).expect("write record");
    }
    writer.finish(&header).expect("finish BAM");
}

fn count_bam_records(path: &Path) -> usize {
    let mut reader = bam::io::reader::Builder.build_from_path(path).expect("open BAM");
    reader.read_header().expect("read header");
    let mut count = 0usize;
    let mut record = bam::Record::default();
    loop {
        match reader.read_record(&mut record) {
            Ok(0) => break,
            Ok(_) => count += 1,
            Err(e) => panic!("read_record error: {e}"),
        }
    }
    count
}

fn fragstat_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fragstat-rs"))
}

fn run(args: &[&std::ffi::OsStr]) -> Output {
    Command::new(fragstat_bin()).args(args).output().expect("failed to spawn fragstat-rs")
}

fn assert_success(output: &Output) {
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "fragstat-rs failed: {stderr}");
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path).expect("read output").lines().map(str::to_string).collect()
}

fn paired_fixture() -> Vec<Rec<'static>> {
    let first = Flags::FIRST_SEGMENT;
    let last = Flags::LAST_SEGMENT;
    let proper = Flags::PROPERLY_SEGMENTED;
    vec![
        // Both mates unique and close together.
        mapped("frag1", first | proper, (0, 100), (0, 300)),
        mapped("frag1", last | proper | Flags::REVERSE_COMPLEMENTED, (0, 300), (0, 100)),
        // Nothing mapped.
        unmapped("frag2", first | Flags::MATE_UNMAPPED),
        unmapped("frag2", last | Flags::MATE_UNMAPPED),
        // Clipped singleton.
        Rec {
            name: "frag3",
            flags: Flags::SEGMENTED | first | Flags::MATE_UNMAPPED,
            at: Some((0, 1000)),
            mate_at: None,
            cigar: &[(Kind::SoftClip, 25), (Kind::Match, 75)],
            md: Some("75"),
            nh: Some(1),
        },
        unmapped("frag3", last),
        // Mates on different references.
        mapped("frag4", first, (0, 500), (1, 500)),
        mapped("frag4", last, (1, 500), (0, 500)),
    ]
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[test]
fn paired_run_writes_every_sink() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.bam");
    write_bam(&input, &paired_fixture());

    let out = dir.path().join("out.bam");
    let unmapped = dir.path().join("unmapped.txt");
    let arp = dir.path().join("arp.txt");
    let breakpoints = dir.path().join("breakpoints.tsv");
    let fragments = dir.path().join("fragments.tsv");
    let stats = dir.path().join("stats.tsv");

    let output = run(&[
        input.as_os_str(),
        "-l".as_ref(),
        "100".as_ref(),
        "-o".as_ref(),
        out.as_os_str(),
        "--unmapped".as_ref(),
        unmapped.as_os_str(),
        "--arp".as_ref(),
        arp.as_os_str(),
        "--breakpoints".as_ref(),
        breakpoints.as_os_str(),
        "--fragments".as_ref(),
        fragments.as_os_str(),
        "--stats".as_ref(),
        stats.as_os_str(),
    ]);
    assert_success(&output);

    assert_eq!(count_bam_records(&out), 5);
    assert_eq!(lines(&unmapped), vec!["frag2", "frag2", "frag3"]);
    assert_eq!(lines(&arp), vec!["frag3", "frag4"]);
    assert_eq!(lines(&breakpoints), vec!["chr1\t1000\tfrag3\tp\tS"]);
    assert_eq!(
        lines(&fragments),
        vec![
            "frag1\t4\tchr1\t100\t199\tchr1\t300\t399\t0\tnone\tnone",
            "frag2\t1\tUM\t0\t0\tUM\t0\t0\t0\t*\t*",
            "frag3\t3\tchr1\t1000\t1074\tUM\t0\t0\t0\tnone\t*",
            "frag4\t4\tchr1\t500\t599\tchr2\t500\t599\t0\tnone\tnone",
        ]
    );

    let stats = lines(&stats);
    assert_eq!(stats[0], "metric\tcount");
    for expected in [
        "reads\t4",
        "mapped\t3",
        "unmapped\t1",
        "unique\t3",
        "singletons\t1",
        "proper_pairs\t1",
        "wrong_pairs\t2",
        "multi\t0",
    ] {
        assert!(stats.iter().any(|l| l == expected), "missing stats row {expected:?} in {stats:?}");
    }
}

#[test]
fn split_inputs_are_merged_by_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fixture = paired_fixture();
    let (odd, even): (Vec<_>, Vec<_>) =
        fixture.into_iter().enumerate().partition(|(i, _)| i % 2 == 0);
    let a = dir.path().join("a.bam");
    let b = dir.path().join("b.bam");
    write_bam(&a, &odd.into_iter().map(|(_, r)| r).collect::<Vec<_>>());
    write_bam(&b, &even.into_iter().map(|(_, r)| r).collect::<Vec<_>>());

    let fof = dir.path().join("inputs.fof");
    fs::write(&fof, format!("# inputs\n{}\n\n{}\n", a.display(), b.display())).expect("write fof");
    let fragments = dir.path().join("fragments.tsv");

    let output = run(&[
        "--fof".as_ref(),
        fof.as_os_str(),
        "-l".as_ref(),
        "100".as_ref(),
        "--fragments".as_ref(),
        fragments.as_os_str(),
    ]);
    assert_success(&output);

    let categories: Vec<String> = lines(&fragments)
        .iter()
        .map(|l| l.split('\t').take(2).collect::<Vec<_>>().join(" "))
        .collect();
    assert_eq!(categories, vec!["frag1 4", "frag2 1", "frag3 3", "frag4 4"]);
}

#[test]
fn single_end_summaries_go_to_stdout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("se.bam");
    write_bam(
        &input,
        &[
            Rec {
                name: "s1",
                flags: Flags::empty(),
                at: Some((0, 100)),
                mate_at: None,
                cigar: M100,
                md: Some("10A89"),
                nh: Some(2),
            },
            Rec {
                name: "s1",
                flags: Flags::SECONDARY,
                at: Some((1, 5000)),
                mate_at: None,
                cigar: M100,
                md: Some("100"),
                nh: Some(2),
            },
            Rec {
                name: "s2",
                flags: Flags::UNMAPPED,
                at: None,
                mate_at: None,
                cigar: &[],
                md: None,
                nh: None,
            },
        ],
    );

    let output = run(&[
        input.as_os_str(),
        "-l".as_ref(),
        "100".as_ref(),
        "-t".as_ref(),
        "single".as_ref(),
    ]);
    assert_success(&output);

    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    let rows: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        rows,
        vec!["s1\tchr2\t5000\t5099\t+\t0\t1\t11,none,", "s2\t*\t0\t0\t+\t0\t0\tnone,"]
    );
}

#[test]
fn malformed_md_aborts_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("bad.bam");
    let mut bad = mapped("bad", Flags::FIRST_SEGMENT, (0, 100), (0, 300));
    bad.md = Some("10^5");
    write_bam(&input, &[bad]);

    let output = run(&[input.as_os_str(), "-l".as_ref(), "100".as_ref()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed MD string"), "unexpected stderr: {stderr}");
}

#[test]
fn read_length_is_required() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.bam");
    write_bam(&input, &paired_fixture());
    let output = run(&[input.as_os_str()]);
    assert!(!output.status.success());
}
