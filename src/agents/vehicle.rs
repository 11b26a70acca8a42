use crate::behaviour::behaviour::{Behaviour, BehaviourModel};
use crate::utils::rand::SimRng;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a vehicle.
///
/// Lanes hold these handles; the driver and the behaviour models take short
/// borrows through them. The simulation is strictly single-threaded, so
/// `Rc<RefCell<..>>` sharing is sufficient.
pub type VehicleRef = Rc<RefCell<Vehicle>>;

pub type VehicleID = u64; // Alias for VehicleID

/// Represents a single vehicle driving along the road.
///
/// A vehicle is constructed at position 0 by the spawner, inserted into one
/// lane, mutated only by the simulation driver (through its behaviour model)
/// during the update phase, and removed once its position exceeds the road
/// length.
#[derive(Debug, Clone)]
pub struct Vehicle {
    /// Unique identifier, assigned monotonically across the whole run
    pub id: VehicleID,
    /// Longitudinal position along the road (meters, nonnegative)
    pub position: f64,
    /// Current velocity (m/s, nonnegative at the end of every tick)
    pub velocity: f64,
    /// Velocity at the start of the current tick (diagnostic)
    pub previous_velocity: f64,
    /// Physical length (meters)
    pub length: f64,
    /// Physical width (meters)
    pub width: f64,
    /// Owned car-following model carrying this driver's parameters
    pub behaviour: BehaviourModel,
}

impl Vehicle {
    /// Constructs a new `VehicleBuilder` for building a `Vehicle` object.
    ///
    /// # Arguments
    /// * `id` - A unique identifier for the vehicle.
    ///
    /// # Returns
    /// A `VehicleBuilder` struct which is used to configure and build the `Vehicle` object.
    ///
    /// # Example
    /// ```
    /// use multilane_traffic_sim_core::agents::Vehicle;
    /// let vehicle = Vehicle::new(1)
    ///     .with_position(0.0)
    ///     .with_length(1.5)
    ///     .build();
    /// println!("Vehicle: {:?}", vehicle);
    /// ```
    pub fn new(id: VehicleID) -> VehicleBuilder {
        VehicleBuilder {
            vehicle: Vehicle {
                id,
                position: 0.0,
                velocity: 0.0,
                previous_velocity: 0.0,
                length: 1.5,
                width: 0.5,
                behaviour: BehaviourModel::default(),
            },
        }
    }

    /// Samples this vehicle's initial velocity from its behaviour model.
    ///
    /// Called once right after construction. The draw is clamped at zero so a
    /// freshly spawned vehicle never rolls backwards.
    pub fn sample_initial_velocity(&mut self, rng: &mut SimRng) {
        let model = self.behaviour.clone();
        model.set_initial_velocity(self, rng);
        if self.velocity < 0.0 {
            self.velocity = 0.0;
        }
    }

    /// Advances the vehicle by one tick of longitudinal motion.
    ///
    /// Records the previous velocity and moves the vehicle forward by
    /// `velocity * delta_t`. The behaviour model then decides the velocity
    /// for the next tick.
    pub fn advance(&mut self, delta_t: f64) {
        self.previous_velocity = self.velocity;
        self.position += self.velocity * delta_t;
    }
}

/// A builder pattern implementation for constructing `Vehicle` objects.
///
/// `VehicleBuilder` allows for optional configuration of `Vehicle` fields before building the final `Vehicle` object.
pub struct VehicleBuilder {
    vehicle: Vehicle,
}

impl VehicleBuilder {
    /// Sets the longitudinal position (meters).
    ///
    /// # Example
    /// ```rust
    /// use multilane_traffic_sim_core::agents::Vehicle;
    /// let vehicle = Vehicle::new(1)
    ///     .with_position(120.0)
    ///     .build();
    /// println!("Vehicle: {:?}", vehicle);
    /// ```
    pub fn with_position(mut self, position: f64) -> Self {
        self.vehicle.position = position;
        self
    }

    /// Sets the current velocity (m/s).
    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.vehicle.velocity = velocity;
        self
    }

    /// Sets the physical length (meters).
    pub fn with_length(mut self, length: f64) -> Self {
        self.vehicle.length = length;
        self
    }

    /// Sets the physical width (meters).
    pub fn with_width(mut self, width: f64) -> Self {
        self.vehicle.width = width;
        self
    }

    /// Sets the car-following behaviour model.
    ///
    /// # Example
    /// ```rust
    /// use multilane_traffic_sim_core::agents::Vehicle;
    /// use multilane_traffic_sim_core::behaviour::{BehaviourModel, SimpleModel};
    /// let vehicle = Vehicle::new(1)
    ///     .with_behaviour(BehaviourModel::Simple(SimpleModel::new(27.78)))
    ///     .build();
    /// println!("Vehicle: {:?}", vehicle);
    /// ```
    pub fn with_behaviour(mut self, behaviour: BehaviourModel) -> Self {
        self.vehicle.behaviour = behaviour;
        self
    }

    /// Builds the final `Vehicle` object with the configured properties.
    ///
    /// # Returns
    /// The fully constructed `Vehicle` object.
    pub fn build(self) -> Vehicle {
        self.vehicle
    }

    /// Builds a shared reference to the `Vehicle` object.
    ///
    /// # Returns
    /// A reference to the `Vehicle` object.
    pub fn build_ref(self) -> VehicleRef {
        Rc::new(RefCell::new(self.vehicle))
    }
}
