//! The n-puzzle and plank domains through the engine contract, with a
//! petgraph oracle cross-checking BFS layering.

use std::collections::HashMap;

use petgraph::algo::dijkstra;
use petgraph::graph::DiGraph;

use wavefront::domain::npuzzle::NPuzzle;
use wavefront::domain::plank::Plank;
use wavefront::engine::{DddBfs, DddOptions, MemBfs, MemOptions};
use wavefront::Domain;

#[test]
fn two_by_two_puzzle_reaches_half_the_permutations() {
    // {3 1 / 2 0} → {1 2 / 3 0}: only the even-parity half of the 24
    // permutations is connected to the start.
    let domain = NPuzzle::load("size 2 2\nmap\n31\n20\n").unwrap();
    let outcome = MemBfs::solve(&domain, &MemOptions { stop_on_goal: false }).unwrap();
    assert_eq!(domain.space().count(), Some(24));
    assert_eq!(outcome.reachable, 12);
    assert_eq!(outcome.goal_depth, Some(4));
}

#[test]
fn npuzzle_solution_walks_the_short_side_of_the_cycle() {
    // The 2×2 state graph is a 12-cycle; this start sits four moves from
    // the goal one way and eight the other.
    let domain = NPuzzle::load("size 2 2\nmap\n31\n20\n").unwrap();
    let outcome = MemBfs::solve(&domain, &MemOptions { stop_on_goal: true }).unwrap();
    assert_eq!(outcome.solution_length(), Some(4));
}

#[test]
fn sliding_moves_are_undirected_so_ddd_can_drop_history() {
    let domain = NPuzzle::load("size 2 2\nmap\n31\n20\n").unwrap();
    let directed = DddBfs::solve(
        &domain,
        &DddOptions {
            capacity: 64,
            undirected: false,
            stop_on_goal: false,
        },
    )
    .unwrap();
    let undirected = DddBfs::solve(
        &domain,
        &DddOptions {
            capacity: 64,
            undirected: true,
            stop_on_goal: false,
        },
    )
    .unwrap();
    assert_eq!(directed.reachable, 12);
    assert_eq!(directed.generations, undirected.generations);
}

#[test]
fn bfs_layering_matches_a_petgraph_oracle() {
    let domain = NPuzzle::load("size 2 2\nmap\n31\n20\n").unwrap();
    let outcome = MemBfs::solve(&domain, &MemOptions { stop_on_goal: false }).unwrap();

    // Rebuild the reachable graph explicitly and let petgraph assign
    // depths with unit weights.
    let mut graph: DiGraph<u64, ()> = DiGraph::new();
    let mut nodes = HashMap::new();
    let mut cfg = domain.start();
    let start = domain.encode(&cfg).unwrap();
    let mut stack = vec![start];
    nodes.insert(start, graph.add_node(start));
    let mut succ = Vec::new();
    while let Some(rank) = stack.pop() {
        domain.decode(rank, &mut cfg).unwrap();
        succ.clear();
        domain.expand(&mut cfg, &mut succ).unwrap();
        let from = nodes[&rank];
        for s in succ.clone() {
            let to = *nodes.entry(s.rank).or_insert_with(|| {
                stack.push(s.rank);
                graph.add_node(s.rank)
            });
            graph.add_edge(from, to, ());
        }
    }

    let depths = dijkstra(&graph, nodes[&start], None, |_| 1u64);
    let mut histogram = vec![0u64; outcome.generations.len()];
    for depth in depths.values() {
        histogram[*depth as usize] += 1;
    }
    assert_eq!(histogram, outcome.generations);
}

#[test]
fn plank_carry_crossing() {
    // The first gap is bridged; the second plank must be fetched, carried
    // across, and dropped to reach the target.
    let domain = Plank::load("size 9 1\nmap\nS-*   *-T\n").unwrap();
    let outcome = MemBfs::solve(&domain, &MemOptions { stop_on_goal: true }).unwrap();
    assert!(outcome.goal_depth.is_none());

    // With an exactly fitting middle gap the crossing works.
    let domain = Plank::load("size 7 1\nmap\nS-* *-T\n").unwrap();
    let outcome = MemBfs::solve(&domain, &MemOptions { stop_on_goal: true }).unwrap();
    assert!(outcome.goal_depth.is_some());
}

#[test]
fn plank_pickup_and_drop_roundtrip() {
    let domain = Plank::load("size 7 1\nmap\nS-* *-T\n").unwrap();
    let outcome = MemBfs::solve(&domain, &MemOptions { stop_on_goal: false }).unwrap();
    // Every (stump, layout, inventory) combination the rules admit.
    assert!(outcome.reachable > 4);
    assert!(outcome.goal_depth.is_some());
}
