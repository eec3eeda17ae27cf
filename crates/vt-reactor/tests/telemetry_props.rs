mod common;

use common::{Journal, RecordingActuator, ScriptedSensor};
use proptest::prelude::*;
use vt_controls::PidConfig;
use vt_core::{ManualClock, VesselId};
use vt_reactor::{ReactorController, TelemetryChannel, TickOutcome};

proptest! {
    #[test]
    fn channels_track_enabled_ticks(
        schedule in prop::collection::vec(any::<bool>(), 0..60),
        readings in prop::collection::vec(0.0f64..80.0, 1..20),
    ) {
        let journal = Journal::default();
        let clock = ManualClock::new(0.0);
        let mut c = ReactorController::new(
            VesselId::new(0),
            ScriptedSensor::new(readings, &journal),
            RecordingActuator::new(&journal),
            clock.clone(),
            &PidConfig::default(),
            39.0,
            true,
        )
        .unwrap();

        let mut enabled_ticks = 0;
        for enabled in schedule {
            if enabled {
                c.enable();
            } else if c.is_enabled() {
                c.disable().unwrap();
            }
            clock.advance(1.0);
            match c.tick().unwrap() {
                TickOutcome::Applied(s) => {
                    prop_assert!(enabled);
                    prop_assert!(s.control_value.abs() <= 100);
                    enabled_ticks += 1;
                }
                TickOutcome::Disabled => prop_assert!(!enabled),
            }
        }

        prop_assert_eq!(c.telemetry().len(), enabled_ticks);
        for channel in TelemetryChannel::ALL {
            prop_assert_eq!(c.telemetry().channel(channel).len(), enabled_ticks);
        }
    }
}
