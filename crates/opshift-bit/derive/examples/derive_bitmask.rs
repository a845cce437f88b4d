use opshift_bit_derive::Key;
use opshift_bit_mask::{Bitable, Bitmask, Named};

#[derive(Key, Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Shift {
    DriverDebug,
    CoDriverAlt,
    CoDriverPOV,
}

fn main() {
    assert_eq!(Shift::DriverDebug.bit(), 1u64 << 0);
    assert_eq!(Shift::CoDriverPOV.index(), 2);
    assert_eq!(Shift::CoDriverAlt.name(), "co_driver_alt");
    assert_eq!(Shift::from_name("co_driver_pov"), Some(Shift::CoDriverPOV));

    let active: Bitmask<Shift> = Shift::ALL.iter().copied().collect();
    assert_eq!(active.count(), 3);
}
