use fragstat_rs::cigar::{ClipType, clip_threshold, decode_cigar};
use fragstat_rs::error::FragError;
use noodles::sam::alignment::record::cigar::{op::Kind as CigarKind, Op as CigarOp};

fn ops(list: &[(CigarKind, usize)]) -> Vec<CigarOp> {
    list.iter().map(|&(kind, len)| CigarOp::new(kind, len)).collect()
}

#[test]
fn clip_threshold_is_clamped() {
    assert_eq!(clip_threshold(40, 0.25), 15);
    assert_eq!(clip_threshold(60, 0.25), 15);
    assert_eq!(clip_threshold(76, 0.25), 19);
    assert_eq!(clip_threshold(100, 0.25), 21);
    assert_eq!(clip_threshold(200, 0.25), 21);
}

#[test]
fn clip_threshold_rounds_half_up() {
    // 0.25 * 70 = 17.5
    assert_eq!(clip_threshold(70, 0.25), 18);
}

#[test]
fn single_block_without_skip() {
    let g = decode_cigar("r", &ops(&[(CigarKind::Match, 100)]), 21).unwrap();
    assert_eq!(g.block_starts, vec![0]);
    assert_eq!(g.block_lengths, vec![100]);
    assert_eq!(g.alignment_end, 100);
    assert!(!g.junction);
    assert!(!g.chimeric);
    assert_eq!(g.clip, ClipType::None);
}

#[test]
fn skip_opens_a_new_block() {
    let g = decode_cigar(
        "r",
        &ops(&[(CigarKind::Match, 30), (CigarKind::Skip, 500), (CigarKind::Match, 70)]),
        21,
    )
    .unwrap();
    assert_eq!(g.block_starts, vec![0, 530]);
    assert_eq!(g.block_lengths, vec![30, 70]);
    assert_eq!(g.alignment_end, 600);
    assert!(g.junction);
    assert_eq!(g.last_block_end(), 600);
}

#[test]
fn deletions_extend_the_block() {
    let g = decode_cigar(
        "r",
        &ops(&[(CigarKind::Match, 10), (CigarKind::Deletion, 2), (CigarKind::Match, 10)]),
        21,
    )
    .unwrap();
    assert_eq!(g.block_lengths, vec![22]);
    assert_eq!(g.alignment_end, 22);
}

#[test]
fn long_leading_soft_clip_is_chimeric_at_head() {
    let g = decode_cigar("r", &ops(&[(CigarKind::SoftClip, 25), (CigarKind::Match, 75)]), 21)
        .unwrap();
    assert!(g.chimeric);
    assert!(g.clipped_at_head);
    assert_eq!(g.clip, ClipType::Soft);
    assert_eq!(g.leading_soft_clip, 25);
}

#[test]
fn long_trailing_hard_clip_is_chimeric_at_tail() {
    let g = decode_cigar("r", &ops(&[(CigarKind::Match, 70), (CigarKind::HardClip, 30)]), 21)
        .unwrap();
    assert!(g.chimeric);
    assert!(!g.clipped_at_head);
    assert_eq!(g.clip, ClipType::Hard);
}

#[test]
fn short_hard_clip_is_not_chimeric() {
    let g = decode_cigar("r", &ops(&[(CigarKind::HardClip, 10), (CigarKind::Match, 90)]), 21)
        .unwrap();
    assert!(!g.chimeric);
    assert_eq!(g.clip, ClipType::None);
}

#[test]
fn clip_just_below_threshold_is_ignored() {
    let g = decode_cigar("r", &ops(&[(CigarKind::Match, 80), (CigarKind::SoftClip, 20)]), 21)
        .unwrap();
    assert!(!g.chimeric);
    let g = decode_cigar("r", &ops(&[(CigarKind::Match, 79), (CigarKind::SoftClip, 21)]), 21)
        .unwrap();
    assert!(g.chimeric);
}

#[test]
fn soft_clip_inside_hard_clip_is_not_terminal() {
    let g = decode_cigar(
        "r",
        &ops(&[(CigarKind::HardClip, 5), (CigarKind::SoftClip, 30), (CigarKind::Match, 65)]),
        21,
    )
    .unwrap();
    assert!(!g.chimeric);
}

#[test]
fn insertion_keys_are_read_offsets() {
    let g = decode_cigar(
        "r",
        &ops(&[
            (CigarKind::SoftClip, 4),
            (CigarKind::Match, 10),
            (CigarKind::Insertion, 3),
            (CigarKind::Match, 5),
            (CigarKind::Skip, 100),
            (CigarKind::Match, 5),
            (CigarKind::Insertion, 1),
            (CigarKind::Match, 2),
        ]),
        21,
    )
    .unwrap();
    let insertions: Vec<(u32, u32)> = g.insertions.into_iter().collect();
    assert_eq!(insertions, vec![(11, 3), (24, 1)]);
    // Insertions consume no reference.
    assert_eq!(g.alignment_end, 122);
}

#[test]
fn sequence_match_op_is_rejected() {
    let err = decode_cigar("read7", &ops(&[(CigarKind::SequenceMatch, 50)]), 21).unwrap_err();
    match err {
        FragError::UnsupportedCigarOp { read, kind } => {
            assert_eq!(read, "read7");
            assert_eq!(kind, CigarKind::SequenceMatch);
        }
        other => panic!("unexpected error: {other}"),
    }
}
