//! Codec bijection properties: every rank in `[0, N)` decodes to a
//! configuration that encodes back to the same rank, for each domain.

use proptest::prelude::*;

use wavefront::domain::npuzzle::NPuzzle;
use wavefront::domain::plank::Plank;
use wavefront::domain::sokoban::Sokoban;
use wavefront::Domain;

const POPUP: &str = "size 7 3\nmap\n#######\n#@o$. #\n#######\n";

const CORRIDOR: &str = "\
size 8 7
map
########
#      #
# $ ####
# $ ...#
# $ ####
#@     #
########
";

fn assert_full_range<D: Domain>(domain: &D) {
    let mut cfg = domain.start();
    for rank in 0..=domain.space().max_rank() {
        domain.decode(rank, &mut cfg).unwrap();
        assert_eq!(domain.encode(&cfg).unwrap(), rank, "rank {rank} failed");
    }
}

#[test]
fn sokoban_popup_full_range() {
    let domain = Sokoban::load(POPUP).unwrap();
    assert_full_range(&domain);
}

#[test]
fn sokoban_corridor_full_range() {
    let domain = Sokoban::load(CORRIDOR).unwrap();
    // Player slots × block layer: every rank must survive one round trip.
    assert!(domain.space().max_rank() < 1 << 20);
    assert_full_range(&domain);
}

#[test]
fn plank_full_range() {
    let domain = Plank::load("size 7 1\nmap\nS-* *-T\n").unwrap();
    assert_full_range(&domain);
}

#[test]
fn npuzzle_full_range() {
    let domain = NPuzzle::load("size 2 2\nmap\n31\n20\n").unwrap();
    assert_full_range(&domain);
}

#[test]
fn reachable_states_stay_in_range() {
    // Every configuration the move generator can reach must encode below
    // N; engines would otherwise report the invariant breach.
    let domain = Sokoban::load(CORRIDOR).unwrap();
    let outcome = wavefront::MemBfs::solve(
        &domain,
        &wavefront::engine::MemOptions { stop_on_goal: false },
    )
    .unwrap();
    assert!(outcome.reachable <= domain.space().max_rank() + 1);
}

proptest! {
    #[test]
    fn random_ranks_roundtrip(seed in 0u64..1 << 16) {
        let domain = Sokoban::load(CORRIDOR).unwrap();
        let rank = seed % (domain.space().max_rank() + 1);
        let mut cfg = domain.start();
        domain.decode(rank, &mut cfg).unwrap();
        prop_assert_eq!(domain.encode(&cfg).unwrap(), rank);
    }
}
