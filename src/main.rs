use flowcloud::geometry::ParticleGeometry;
use flowcloud::CloudConfig;

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|v| v == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse::<T>().ok())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = CloudConfig::new();

    if let Some(count) = parse_arg::<u32>(&args, "--particles") {
        config = config.with_particle_geometry(ParticleGeometry::Fibonacci {
            radius: 0.02,
            count: count.max(1),
        });
    }
    if let Some(seed) = parse_arg::<u64>(&args, "--seed") {
        config = config.with_seed(seed);
    }
    if let Some(influence) = parse_arg::<f32>(&args, "--influence") {
        config = config.with_flow_field_influence(influence);
    }
    if let Some(strength) = parse_arg::<f32>(&args, "--strength") {
        config = config.with_flow_field_strength(strength);
    }
    if let Some(frequency) = parse_arg::<f32>(&args, "--frequency") {
        config = config.with_flow_field_frequency(frequency);
    }

    if let Err(e) = flowcloud::window::run(config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
