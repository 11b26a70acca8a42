use multilane_traffic_sim_core::simulation::settings::SimulationSettings;
use multilane_traffic_sim_core::simulation::simulation::Simulation;
use multilane_traffic_sim_core::verbose::{VerboseLevel, set_verbose_level};

/// Two lanes of Gipps traffic on a short road, reproducing the classic
/// two-lane overtaking setup. Output lands under ./tmp/gipps_model_mul_lane.
fn main() {
    set_verbose_level(VerboseLevel::Main);

    let document = r#"{
        "name": {
            "id": "gipps_model_mul_lane",
            "description": "A simulation with the Gipps model"
        },
        "road": {"length": 500.0, "lanes": 2},
        "simulation": {"time_step": 0.1, "duration": 3600.0},
        "spawn": {"process": "poisson", "cars_per_second": 0.4},
        "vehicle": {
            "behavior": ["Gipps Model", {
                "maximum_acceleration": {"mu": 1.5, "sigma": 0.1},
                "maximum_deceleration": {"mu": 1.0, "sigma": 0.1},
                "apparent_reaction_time": {"mu": 1.1, "sigma": 0.1},
                "comfortable_distance": {"mu": 2.0, "sigma": 0.2}
            }],
            "behavior_settings": [27.78, 2.22],
            "length": 1.5
        },
        "lane_distribution": "all_in_first_lane"
    }"#;

    let settings = match SimulationSettings::from_json(document) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Bad configuration document: {}", err);
            std::process::exit(1);
        }
    };

    let simulation = match Simulation::from_settings(settings, 7) {
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
