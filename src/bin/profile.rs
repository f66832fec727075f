use wavemaze::{
    maze::Maze,
    solvers::{Strategy, search},
};

fn main() {
    let mut args = std::env::args();
    args.next(); // Skip executable name
    let iterations = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(100);

    for strategy in [Strategy::Bfs, Strategy::Dfs, Strategy::Wavefront] {
        let started = std::time::Instant::now();
        for seed in 0..iterations {
            let maze = Maze::new(201, 201, Some(seed));
            let outcome = search(maze.grid(), maze.start(), maze.end(), strategy, Some(seed));
            std::hint::black_box(outcome);
        }
        println!(
            "{}: {} iterations in {:?}",
            strategy,
            iterations,
            started.elapsed()
        );
    }
}
