use super::*;
use crossbeam_channel::Receiver;
use crate::descriptor::descriptor_set::ReleasedSet;
use crate::descriptor::handles::NativeSet;
use crate::descriptor::mock_backend::*;

const PIPELINE_LAYOUT: NativePipelineLayout = NativePipelineLayout::from_raw(900);

fn make_set(
    device: &Arc<MockDescriptorDevice>,
    bindings: Vec<crate::descriptor::layout::DescriptorSetLayoutBinding>,
    raw: u64,
) -> (Arc<DescriptorSet>, Receiver<ReleasedSet>) {
    let layout = create_layout(device, bindings);
    let (sender, receiver) = crossbeam_channel::unbounded();
    let set = Arc::new(DescriptorSet::new(NativeSet::from_raw(raw), layout, sender));
    (set, receiver)
}

#[test]
fn test_new_history_is_unbound_and_retains_set() {
    let device = MockDescriptorDevice::new();
    let (set, _rx) = make_set(&device, vec![ubo(0), sampler(3)], 100);
    let history = BindingHistory::new(&set);

    assert!(!history.bound());
    assert!(history.retains_set());
    assert_eq!(history.written_mask(), 0);
    assert_eq!(history.native(), set.native());
    assert_eq!(history.layout(), set.layout().native());
    assert_eq!(history.max_index(), Some(3));
    assert_eq!(*history.count(), ResourceCount::new(1, 0, 1, 0));
    assert_eq!(Arc::strong_count(&set), 2);
}

#[test]
fn test_write_marks_binding_and_clears_bound() {
    let device = MockDescriptorDevice::new();
    let (set, _rx) = make_set(&device, vec![ubo(0), ubo(2)], 100);
    let mut history = BindingHistory::new(&set);
    let mut commands = MockCommandStream::new();

    history.bind(&mut commands, PIPELINE_LAYOUT, 0);
    assert!(history.bound());

    history.write(2);
    assert!(!history.bound());
    assert!(history.written(2));
    assert!(!history.written(0));
    assert_eq!(history.written_mask(), 0b100);
}

#[test]
fn test_set_offsets_clears_bound() {
    let device = MockDescriptorDevice::new();
    let (set, _rx) = make_set(&device, vec![dynamic_ubo(0), dynamic_ubo(1)], 100);
    let mut history = BindingHistory::new(&set);
    let mut commands = MockCommandStream::new();

    history.bind(&mut commands, PIPELINE_LAYOUT, 1);
    history.set_offsets(vec![256, 512]);
    assert!(!history.bound());
    assert_eq!(history.offsets(), &[256, 512]);
}

#[test]
#[should_panic]
fn test_too_many_offsets_panics() {
    let device = MockDescriptorDevice::new();
    let (set, _rx) = make_set(&device, vec![dynamic_ubo(0), ubo(1)], 100);
    let mut history = BindingHistory::new(&set);
    history.set_offsets(vec![0, 64]);
}

#[test]
fn test_bind_records_command_and_moves_acquisition() {
    let device = MockDescriptorDevice::new();
    let (set, _rx) = make_set(&device, vec![dynamic_ubo(0)], 100);
    let mut history = BindingHistory::new(&set);
    let mut commands = MockCommandStream::new();
    history.set_offsets(vec![128]);

    history.bind(&mut commands, PIPELINE_LAYOUT, 2);

    assert_eq!(commands.binds, vec![RecordedBind {
        pipeline_layout: PIPELINE_LAYOUT,
        set_index: 2,
        set: set.native(),
        dynamic_offsets: vec![128],
    }]);
    assert_eq!(commands.acquired_sets(), vec![set.native()]);
    assert!(history.bound());
    assert!(!history.retains_set());
    // caller + command stream
    assert_eq!(Arc::strong_count(&set), 2);
}

#[test]
fn test_bind_pads_missing_offsets_with_zero() {
    let device = MockDescriptorDevice::new();
    let (set, _rx) = make_set(&device, vec![dynamic_ubo(0), dynamic_ubo(1), ubo(2)], 100);
    let mut history = BindingHistory::new(&set);
    let mut commands = MockCommandStream::new();

    history.bind(&mut commands, PIPELINE_LAYOUT, 0);
    assert_eq!(commands.binds[0].dynamic_offsets, vec![0, 0]);

    history.set_offsets(vec![64]);
    history.bind(&mut commands, PIPELINE_LAYOUT, 0);
    assert_eq!(commands.binds[1].dynamic_offsets, vec![64, 0]);
}

#[test]
fn test_rebind_acquires_again_through_weak_reference() {
    let device = MockDescriptorDevice::new();
    let (set, _rx) = make_set(&device, vec![ubo(0)], 100);
    let mut history = BindingHistory::new(&set);
    let mut first = MockCommandStream::new();
    let mut second = MockCommandStream::new();

    history.bind(&mut first, PIPELINE_LAYOUT, 0);
    history.write(0);
    history.bind(&mut second, PIPELINE_LAYOUT, 0);

    assert_eq!(first.acquired_sets(), vec![set.native()]);
    assert_eq!(second.acquired_sets(), vec![set.native()]);
}

#[test]
fn test_unbind_reacquires_set() {
    let device = MockDescriptorDevice::new();
    let (set, _rx) = make_set(&device, vec![ubo(0)], 100);
    let mut history = BindingHistory::new(&set);
    let mut commands = MockCommandStream::new();

    history.bind(&mut commands, PIPELINE_LAYOUT, 0);
    commands.retire();
    assert_eq!(Arc::strong_count(&set), 1);

    history.unbind();
    assert!(history.retains_set());
    assert!(!history.bound());
    assert_eq!(Arc::strong_count(&set), 2);

    // Unbinding twice does not stack acquisitions
    history.unbind();
    assert_eq!(Arc::strong_count(&set), 2);
}

#[test]
fn test_dropping_history_releases_its_acquisition() {
    let device = MockDescriptorDevice::new();
    let (set, rx) = make_set(&device, vec![ubo(0)], 100);
    let native = set.native();
    let history = BindingHistory::new(&set);

    drop(set);
    assert!(rx.try_recv().is_err());

    drop(history);
    let released = rx.try_recv().unwrap();
    assert_eq!(released.native, native);
    assert_eq!(released.count, ResourceCount::new(1, 0, 0, 0));
}

#[test]
fn test_write_texture_deduplicates_bundles() {
    let device = MockDescriptorDevice::new();
    let (set, _rx) = make_set(&device, vec![sampler(0), sampler(1)], 100);
    let mut history = BindingHistory::new(&set);
    let texture = MockTexture::sampled_2d(10);
    let other = MockTexture::sampled_2d(20);
    let range = texture.primary_view_range();

    history.write_texture(0, range, &texture);
    history.write_texture(1, range, &texture);
    history.write_texture(1, range, &other);

    assert_eq!(history.referenced_textures().len(), 2);
    assert!(history.written(0) && history.written(1));
}

#[test]
fn test_written_out_of_range_is_false() {
    let device = MockDescriptorDevice::new();
    let (set, _rx) = make_set(&device, vec![ubo(0)], 100);
    let history = BindingHistory::new(&set);
    assert!(!history.written(64));
}
