use codspeed_criterion_compat::{black_box, criterion_group, criterion_main, Criterion};
use opshift_bindings::parse_bindings;
use opshift_bit_derive::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
enum Operation {
    DriveForward,
    DriveTurn,
    DriveSlow,
    ResetGyro,
    IntakeIn,
    IntakeOut,
    ShooterSpin,
    ShooterFeed,
    ElevatorUp,
    ElevatorDown,
    ElevatorPower,
    ArmAngle,
    Climb,
    AutoShoot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
enum Shift {
    CoDriverAlt,
    DriverDebug,
}

fn bench_parse_bindings(c: &mut Criterion) {
    let yaml: &str = include_str!("../../../bindings.yaml");

    c.bench_function("bindings_parse_sample", |b| {
        b.iter(|| {
            let input = black_box(yaml);
            let bindings =
                parse_bindings::<Operation, Shift>(input).expect("bindings should parse");
            black_box(bindings);
        })
    });
}

criterion_group!(benches, bench_parse_bindings);
criterion_main!(benches);
