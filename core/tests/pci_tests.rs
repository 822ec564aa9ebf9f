mod common;

use common::FakeBus;
use ember_core::error::Error;
use ember_core::pci::{ConfigScheme, PciConfigSpace, PciScanner};
use hal::mem::PhysAddr;

const ECAM_BASE: usize = 0x4000_0000;

fn scheme() -> ConfigScheme {
    ConfigScheme::Ecam {
        base: PhysAddr(ECAM_BASE),
    }
}

fn scanner<const N: usize>(bus: &FakeBus) -> PciScanner<&FakeBus, N> {
    PciScanner::new(PciConfigSpace::new(bus, scheme()))
}

fn reg_addr(bus: u8, device: u8, function: u8, reg: u16) -> usize {
    scheme().address(bus, device, function, reg).0
}

/// seeds the config space of one function.
fn put_function(
    fake: &FakeBus,
    bus: u8,
    device: u8,
    function: u8,
    class: (u8, u8, u8),
    header_type: u8,
) {
    fake.poke32(reg_addr(bus, device, function, 0x00), 0x1af4_1000);
    fake.poke32(
        reg_addr(bus, device, function, 0x08),
        (class.0 as u32) << 24 | (class.1 as u32) << 16 | (class.2 as u32) << 8,
    );
    fake.poke32(
        reg_addr(bus, device, function, 0x0c),
        (header_type as u32) << 16,
    );
}

fn put_bridge(fake: &FakeBus, bus: u8, device: u8, function: u8, secondary_bus: u8) {
    put_function(fake, bus, device, function, (0x06, 0x04, 0x00), 0x01);
    fake.poke32(
        reg_addr(bus, device, function, 0x18),
        (secondary_bus as u32) << 8,
    );
}

#[test]
fn scan_records_a_single_root_device() {
    let fake = FakeBus::all_ones();
    put_function(&fake, 0, 0, 0, (0x06, 0x00, 0x00), 0x00);

    let mut scanner = scanner::<8>(&fake);
    scanner.scan_all().unwrap();

    let devices = scanner.devices();
    assert_eq!(devices.len(), 1);
    assert_eq!((devices[0].bus, devices[0].device, devices[0].function), (0, 0, 0));
    assert!(devices[0].class_code.matches(0x06, 0x00));
}

#[test]
fn scan_recurses_into_bridges_pre_order() {
    let fake = FakeBus::all_ones();
    put_function(&fake, 0, 0, 0, (0x06, 0x00, 0x00), 0x00);
    put_bridge(&fake, 0, 1, 0, 1);
    put_function(&fake, 1, 0, 0, (0x0c, 0x03, 0x30), 0x00);

    let mut scanner = scanner::<8>(&fake);
    scanner.scan_all().unwrap();

    let order: Vec<_> = scanner
        .devices()
        .iter()
        .map(|d| (d.bus, d.device, d.function))
        .collect();
    assert_eq!(order, vec![(0, 0, 0), (0, 1, 0), (1, 0, 0)]);
    assert!(scanner.devices()[2].class_code.matches(0x0c, 0x03));
}

#[test]
fn scan_visits_secondary_functions_of_multi_function_devices() {
    let fake = FakeBus::all_ones();
    put_function(&fake, 0, 0, 0, (0x06, 0x00, 0x00), 0x00);
    put_function(&fake, 0, 2, 0, (0x02, 0x00, 0x00), 0x80);
    put_function(&fake, 0, 2, 3, (0x02, 0x00, 0x00), 0x00);

    let mut scanner = scanner::<8>(&fake);
    scanner.scan_all().unwrap();

    let order: Vec<_> = scanner
        .devices()
        .iter()
        .map(|d| (d.bus, d.device, d.function))
        .collect();
    assert_eq!(order, vec![(0, 0, 0), (0, 2, 0), (0, 2, 3)]);
}

#[test]
fn scan_reports_full_and_keeps_partial_table() {
    let fake = FakeBus::all_ones();
    put_function(&fake, 0, 0, 0, (0x06, 0x00, 0x00), 0x00);
    put_function(&fake, 0, 1, 0, (0x02, 0x00, 0x00), 0x00);
    put_function(&fake, 0, 2, 0, (0x02, 0x00, 0x00), 0x00);

    let mut scanner = scanner::<2>(&fake);
    assert_eq!(scanner.scan_all(), Err(Error::Full));
    assert_eq!(scanner.devices().len(), 2);
}

#[test]
fn rescan_resets_the_table() {
    let fake = FakeBus::all_ones();
    put_function(&fake, 0, 0, 0, (0x06, 0x00, 0x00), 0x00);

    let mut scanner = scanner::<8>(&fake);
    scanner.scan_all().unwrap();
    scanner.scan_all().unwrap();
    assert_eq!(scanner.devices().len(), 1);
}

#[test]
fn read_bar_32_bit() {
    let fake = FakeBus::all_ones();
    put_function(&fake, 0, 3, 0, (0x02, 0x00, 0x00), 0x00);
    fake.poke32(reg_addr(0, 3, 0, 0x10), 0x9000_0000);

    let mut scanner = scanner::<8>(&fake);
    put_function(&fake, 0, 0, 0, (0x06, 0x00, 0x00), 0x00);
    scanner.scan_all().unwrap();
    let device = *scanner
        .devices()
        .iter()
        .find(|d| d.device == 3)
        .unwrap();

    assert_eq!(scanner.read_bar(&device, 0), Ok(0x9000_0000));
}

#[test]
fn read_bar_64_bit_combines_the_next_register() {
    let fake = FakeBus::all_ones();
    put_function(&fake, 0, 0, 0, (0x06, 0x00, 0x00), 0x00);
    put_function(&fake, 0, 3, 0, (0x02, 0x00, 0x00), 0x00);
    fake.poke32(reg_addr(0, 3, 0, 0x10), 0x8000_000c);
    fake.poke32(reg_addr(0, 3, 0, 0x14), 0x0000_0012);

    let mut scanner = scanner::<8>(&fake);
    scanner.scan_all().unwrap();
    let device = *scanner
        .devices()
        .iter()
        .find(|d| d.device == 3)
        .unwrap();

    assert_eq!(scanner.read_bar(&device, 0), Ok(0x12_8000_000c));
}

#[test]
fn read_bar_index_checks() {
    let fake = FakeBus::all_ones();
    put_function(&fake, 0, 0, 0, (0x06, 0x00, 0x00), 0x00);
    put_function(&fake, 0, 3, 0, (0x02, 0x00, 0x00), 0x00);
    // a 64 bit bar at the last index has no room for its upper half.
    fake.poke32(reg_addr(0, 3, 0, 0x10 + 4 * 5), 0x0000_000c);

    let mut scanner = scanner::<8>(&fake);
    scanner.scan_all().unwrap();
    let device = *scanner
        .devices()
        .iter()
        .find(|d| d.device == 3)
        .unwrap();

    assert_eq!(scanner.read_bar(&device, 6), Err(Error::IndexOutOfRange));
    assert_eq!(scanner.read_bar(&device, 5), Err(Error::IndexOutOfRange));
}

#[test]
fn multi_function_host_bridge_scans_each_function_as_a_bus() {
    let fake = FakeBus::all_ones();
    // host bridge with two functions, each rooting a bus.
    put_function(&fake, 0, 0, 0, (0x06, 0x00, 0x00), 0x80);
    put_function(&fake, 0, 0, 1, (0x06, 0x00, 0x00), 0x00);
    put_function(&fake, 1, 4, 0, (0x02, 0x00, 0x00), 0x00);

    let mut scanner = scanner::<8>(&fake);
    scanner.scan_all().unwrap();

    assert!(scanner
        .devices()
        .iter()
        .any(|d| (d.bus, d.device) == (1, 4)));
}
