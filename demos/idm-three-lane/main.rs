use multilane_traffic_sim_core::simulation::settings::SimulationSettings;
use multilane_traffic_sim_core::simulation::simulation::Simulation;
use multilane_traffic_sim_core::verbose::{VerboseLevel, set_verbose_level};

/// Three lanes of Intelligent Driver Model traffic with Poisson arrivals and
/// a triangle lane distribution. Output lands under ./tmp/idm_three_lane.
fn main() {
    set_verbose_level(VerboseLevel::Main);

    let document = r#"{
        "name": {
            "id": "idm_three_lane",
            "description": "A three-lane simulation with the Intelligent Driver Model"
        },
        "road": {"length": 5000.0, "lanes": 3},
        "simulation": {"time_step": 0.1, "duration": 600.0},
        "spawn": {"process": "poisson", "cars_per_second": 0.6},
        "vehicle": {
            "behavior": ["Intelligent Driver Model", {
                "time_headway": {"mu": 1.5, "sigma": 0.15},
                "max_acceleration": {"mu": 2.0, "sigma": 0.2},
                "comfortable_braking_deceleration": {"mu": 3.0, "sigma": 0.2},
                "minimum_spacing": {"mu": 2.0, "sigma": 0.2},
                "acceleration_exponent": {"mu": 4.0, "sigma": 0.2}
            }],
            "behavior_settings": [27.78, 2.78],
            "length": 1.5
        },
        "lane_distribution": "triangle"
    }"#;

    let settings = match SimulationSettings::from_json(document) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Bad configuration document: {}", err);
            std::process::exit(1);
        }
    };

    let seed = 42;
    let simulation = match Simulation::from_settings(settings, seed) {
        Ok(simulation) => simulation,
        Err(err) => {
            eprintln!("Could not set up the simulation: {}", err);
            std::process::exit(1);
        }
    };

    println!("Running {} steps...", simulation.steps_total());
    match simulation.run() {
        Ok(summary) => {
            println!(
                "Done: {} steps in {:.2} s, {} vehicles spawned, {} completed",
                summary.steps,
                summary.runtime_seconds,
                summary.vehicles_spawned,
                summary.vehicles_departed
            );
            println!("Output written to {}", summary.output_dir.display());
        }
        Err(err) => {
            eprintln!("Simulation aborted: {}", err);
            std::process::exit(1);
        }
    }
}
