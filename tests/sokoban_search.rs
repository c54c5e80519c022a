//! End-to-end Sokoban scenarios: trivial solves, popup walls, force
//! floors, goal cells, deadlock pruning, and load-time rejections.

use wavefront::domain::sokoban::Sokoban;
use wavefront::engine::{MemBfs, MemOptions};

fn solve(text: &str) -> wavefront::SearchOutcome {
    let domain = Sokoban::load(text).unwrap();
    MemBfs::solve(&domain, &MemOptions { stop_on_goal: true }).unwrap()
}

fn exhaust(text: &str) -> wavefront::SearchOutcome {
    let domain = Sokoban::load(text).unwrap();
    MemBfs::solve(&domain, &MemOptions { stop_on_goal: false }).unwrap()
}

const TRIVIAL: &str = "size 5 3\nmap\n#####\n#@$.#\n#####\n";

#[test]
fn trivial_push_solves_in_one_move() {
    let outcome = solve(TRIVIAL);
    assert_eq!(outcome.reachable, 2);
    assert_eq!(outcome.goal_depth, Some(1));
    assert_eq!(outcome.solution_length(), Some(1));
}

#[test]
fn trivial_exhaustive_keeps_searching_past_the_goal() {
    let outcome = exhaust(TRIVIAL);
    // The solved state admits one further walk.
    assert_eq!(outcome.reachable, 3);
    assert_eq!(outcome.generations, vec![1, 1, 1]);
    assert_eq!(outcome.goal_depth, Some(1));
}

#[test]
fn popup_wall_pops_once_and_blocks_reentry() {
    let text = "size 7 3\nmap\n#######\n#@o$. #\n#######\n";
    let outcome = solve(text);
    // Walk onto the popup, then push the block home.
    assert_eq!(outcome.solution_length(), Some(2));

    let full = exhaust(text);
    // start; player on popped popup; walked back (now walled in); solved.
    assert_eq!(full.reachable, 4);
    assert_eq!(full.goal_depth, Some(2));
}

#[test]
fn pushed_block_rides_force_floor_chain() {
    let text = "size 7 3\nmap\n#######\n#@$>.##\n#######\n";
    let outcome = solve(text);
    // One push: the block slides across the conveyor onto the target.
    assert_eq!(outcome.solution_length(), Some(1));
}

#[test]
fn player_rides_force_floor_to_goal_cell() {
    let text = "size 7 3\nmap\n#######\n#@>> g#\n#######\n";
    let outcome = solve(text);
    // Step onto the conveyor (carried to its exit), then step onto g.
    assert_eq!(outcome.solution_length(), Some(2));
}

#[test]
fn explicit_goal_directive_must_be_reached() {
    // Same trivial map, but the player must finish back at the left.
    let text = "size 5 3\ngoal 1 1\nmap\n#####\n#@$.#\n#####\n";
    let outcome = solve(text);
    // Push, then walk back to (1, 1).
    assert_eq!(outcome.solution_length(), Some(2));
}

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

#[test]
fn goal_corridor_instance_solves_with_pruning() {
    let pruned = solve(CORRIDOR);
    let unpruned = solve(&format!("skip-goal-corridor-deadlock\n{CORRIDOR}"));
    assert!(pruned.solution_length().is_some());
    assert_eq!(pruned.solution_length(), unpruned.solution_length());
}

#[test]
fn goal_corridor_pruning_shrinks_the_reachable_set() {
    let pruned = exhaust(CORRIDOR);
    let unpruned = exhaust(&format!("skip-goal-corridor-deadlock\n{CORRIDOR}"));
    assert_eq!(pruned.goal_depth, unpruned.goal_depth);
    // Half-pushed-and-abandoned corridor states exist only unpruned.
    assert!(pruned.reachable < unpruned.reachable);
}

const N_PATTERN: &str = "\
size 8 7
map
########
#  #   #
# $ $  #
# #   .#
#    @.#
#      #
########
";

#[test]
fn n_pattern_instance_solves_with_pruning() {
    let pruned = solve(N_PATTERN);
    let unpruned = solve(&format!("skip-n-deadlock\n{N_PATTERN}"));
    assert!(pruned.solution_length().is_some());
    assert_eq!(pruned.solution_length(), unpruned.solution_length());
}

#[test]
fn n_pattern_pruning_shrinks_the_reachable_set() {
    let pruned = exhaust(N_PATTERN);
    let unpruned = exhaust(&format!("skip-n-deadlock\n{N_PATTERN}"));
    assert_eq!(pruned.goal_depth, unpruned.goal_depth);
    assert!(pruned.reachable < unpruned.reachable);
}

#[test]
fn walks_never_trigger_block_pattern_checks() {
    // A map with no pushes at all still explores every walkable cell.
    let text = "size 5 4\nmap\n#####\n#@  #\n#  g#\n#####\n";
    let outcome = exhaust(text);
    assert_eq!(outcome.reachable, 6);
    assert_eq!(outcome.goal_depth, Some(3));
}

#[test]
fn jammed_blocks_conclude_no_solution() {
    // Two blocks in a row: the rear one cannot pass the front one, and
    // the front one's pusher cell is occupied.
    let text = "size 6 3\nmap\n######\n#@$$.#\n######\n";
    let outcome = exhaust(text);
    assert_eq!(outcome.reachable, 1);
    assert_eq!(outcome.goal_depth, None);
    assert!(outcome.solution.is_none());
}

#[test]
fn block_on_preanalysis_dead_floor_is_a_load_error() {
    // The destination is pull-isolated, so the block's cell is dead.
    let text = "size 5 3\nmap\n#####\n#@$.#\n#####\n";
    let bad = text.replace("#@$.#", "#@.$#");
    assert!(Sokoban::load(&bad).is_err());
}

#[test]
fn more_destinations_than_blocks_is_a_load_error() {
    let text = "size 6 3\nmap\n######\n#@$..#\n######\n";
    assert!(Sokoban::load(text).is_err());
}

#[test]
fn unknown_map_character_is_a_load_error() {
    let text = "size 5 3\nmap\n#####\n#@q.#\n#####\n";
    assert!(Sokoban::load(text).is_err());
}

#[test]
fn missing_player_is_a_load_error() {
    let text = "size 5 3\nmap\n#####\n# $.#\n#####\n";
    assert!(Sokoban::load(text).is_err());
}

#[test]
fn unknown_directives_are_skipped() {
    let text = "size 5 3\nfrobnicate 12\nmap\n#####\n#@$.#\n#####\n";
    let outcome = solve(text);
    assert_eq!(outcome.solution_length(), Some(1));
}
