use opshift_bit_derive::Key;

/// Logical operations of the machine, named in bindings by their snake_case
/// form (`drive_forward`, `auto_shoot`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
pub enum Operation {
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
pub enum Shift {
    CoDriverAlt,
    DriverDebug,
}
