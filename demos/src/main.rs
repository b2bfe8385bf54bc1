//! Illustrative, not load-bearing: shows the full producer/consumer data
//! flow a hypervisor would use to publish per-VM and per-vCPU counters.
//! Carries no design of its own; see the registry crate for that.

use core::ptr::NonNull;

use memoffset::offset_of;
use statsreg::{Aggregation, Source, ValueDescriptor, ValueKind};

#[repr(C)]
struct VcpuStats {
    exits: u64,
    tsc_offset: i64,
}

/// The VM-level descriptor array: `exits` is Sum-aggregated across every
/// vCPU, `tsc_offset` is Avg-aggregated. Both are declared once here and
/// reused by identity across every vCPU's concrete attachment, and again
/// (with `base: None`) at the VM source to mark them as aggregates.
static VCPU_STATS: [ValueDescriptor; 2] = [
    ValueDescriptor::new("exits", offset_of!(VcpuStats, exits), ValueKind::U64, Aggregation::Sum),
    ValueDescriptor::new(
        "tsc-offset",
        offset_of!(VcpuStats, tsc_offset),
        ValueKind::S64,
        Aggregation::Avg,
    ),
];

struct Vcpu {
    stats: Box<VcpuStats>,
    source: std::sync::Arc<statsreg::Source>,
}

fn create_vcpu(id: usize) -> Vcpu {
    let mut stats = Box::new(VcpuStats { exits: 0, tsc_offset: 0 });
    let source = Source::create(format!("vcpu-{id}"));
    let base = NonNull::new(stats.as_mut() as *mut VcpuStats as *mut u8).unwrap();
    source.add_values(&VCPU_STATS, Some(base)).expect("fresh attachment");
    Vcpu { stats, source }
}

fn main() {
    let vm_source = Source::create("vm-0");
    // Placeholder group: declares both descriptors as VM-level aggregates.
    vm_source.add_values(&VCPU_STATS, None).expect("fresh attachment");

    let mut vcpus: Vec<Vcpu> = (0..4).map(create_vcpu).collect();
    for vcpu in &vcpus {
        vm_source.add_subordinate(vcpu.source.clone());
    }

    vcpus[0].stats.exits = 100;
    vcpus[1].stats.exits = 250;
    vcpus[2].stats.exits = 10;
    vcpus[3].stats.exits = 4;

    println!("total exits: {}", vm_source.get_value(&VCPU_STATS[0]).unwrap());
    println!("avg tsc offset: {}", vm_source.get_value(&VCPU_STATS[1]).unwrap() as i64);

    // Teardown: revoke before the backing VcpuStats are freed, then
    // detach. The source tree stays valid even while any leftover
    // consumer handle is still alive; it will simply read zero.
    for vcpu in &vcpus {
        vcpu.source.revoke();
    }
    for vcpu in vcpus.drain(..) {
        vm_source.remove_subordinate(&vcpu.source);
    }

    println!("total exits after teardown: {}", vm_source.get_value(&VCPU_STATS[0]).unwrap());
}
