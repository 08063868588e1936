//! End-to-end content pipeline tests: binary packages, JSON scenes,
//! reference resolution, and skeleton assembly.

use std::sync::Arc;

use glint_core::assembler;
use glint_core::binary::encode_7bit_u32;
use glint_core::content::{
    ContentError, ContentKey, ContentKind, LoadSession, TypeReaderRegistry,
};
use glint_core::math::Mat4;
use glint_core::mesh::{IndexFormat, PrimitiveTopology, VertexSemantic};

/// Routes `log` diagnostics (dropped back edges, unknown semantics)
/// into the test harness output.
fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

fn push_string(out: &mut Vec<u8>, s: &str) {
    encode_7bit_u32(s.len() as u32, out);
    out.extend_from_slice(s.as_bytes());
}

fn push_identity_mat4(out: &mut Vec<u8>) {
    for col in 0..4 {
        for row in 0..4 {
            let v: f32 = if row == col { 1.0 } else { 0.0 };
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
}

/// Wraps a body in a container header plus reader table.
fn container(reader_names: &[&str], body: &[u8]) -> Vec<u8> {
    let mut table = Vec::new();
    encode_7bit_u32(reader_names.len() as u32, &mut table);
    for name in reader_names {
        push_string(&mut table, name);
        table.extend_from_slice(&1i32.to_le_bytes());
    }
    let total = 10 + table.len() + body.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"GLNT");
    out.push(1);
    out.push(0);
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&table);
    out.extend_from_slice(body);
    out
}

/// A model package with two bones, one material cited by both mesh
/// parts, and two triangle-list parts.
fn model_package() -> Vec<u8> {
    let readers = [
        "glint.ModelReader",
        "glint.MaterialReader",
        "glint.VertexBufferReader",
        "glint.IndexBufferReader",
    ];
    let mut body = Vec::new();

    // Primary object: tag 1 = ModelReader.
    encode_7bit_u32(1, &mut body);

    // Bone table.
    encode_7bit_u32(2, &mut body);
    push_string(&mut body, "root");
    push_identity_mat4(&mut body);
    push_string(&mut body, "arm");
    push_identity_mat4(&mut body);
    // root: no parent, one child (bone 2).
    encode_7bit_u32(0, &mut body);
    encode_7bit_u32(1, &mut body);
    encode_7bit_u32(2, &mut body);
    // arm: parent bone 1, no children.
    encode_7bit_u32(1, &mut body);
    encode_7bit_u32(0, &mut body);
    // Root bone id.
    encode_7bit_u32(1, &mut body);

    // Material table: one material, untextured.
    encode_7bit_u32(1, &mut body);
    encode_7bit_u32(2, &mut body); // tag 2 = MaterialReader
    push_string(&mut body, "steel");
    encode_7bit_u32(0, &mut body); // null texture
    for c in [0.8f32, 0.8, 0.8, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0] {
        body.extend_from_slice(&c.to_le_bytes());
    }
    body.extend_from_slice(&16.0f32.to_le_bytes());
    body.extend_from_slice(&1.0f32.to_le_bytes());

    // Mesh table: one mesh on bone 1, two parts sharing material 1.
    encode_7bit_u32(1, &mut body);
    push_string(&mut body, "hull");
    encode_7bit_u32(1, &mut body);
    encode_7bit_u32(2, &mut body);
    for _ in 0..2 {
        // Vertex buffer: float3 positions, 3 vertices.
        encode_7bit_u32(3, &mut body); // tag 3 = VertexBufferReader
        body.extend_from_slice(&12u32.to_le_bytes());
        encode_7bit_u32(1, &mut body);
        push_string(&mut body, "position");
        body.push(2); // Float3
        body.extend_from_slice(&0u32.to_le_bytes());
        encode_7bit_u32(3, &mut body);
        body.extend_from_slice(&[0u8; 36]);
        // Index buffer: u16, 3 indices.
        encode_7bit_u32(4, &mut body); // tag 4 = IndexBufferReader
        body.push(0);
        encode_7bit_u32(3, &mut body);
        for i in [0u16, 1, 2] {
            body.extend_from_slice(&i.to_le_bytes());
        }
        // Topology, vertex count, material id.
        body.push(4); // TriangleList
        encode_7bit_u32(3, &mut body);
        encode_7bit_u32(1, &mut body);
    }

    container(&readers, &body)
}

#[test]
fn test_binary_model_package() {
    init_logging();
    let registry = TypeReaderRegistry::standard();
    let data = model_package();
    let mut session = LoadSession::from_binary(&registry, &data).unwrap();

    let model = session.read_object().unwrap().unwrap().into_model().unwrap();

    assert_eq!(model.bones.len(), 2);
    let root = model.root_bone.as_ref().unwrap();
    assert_eq!(root.name, "root");
    assert_eq!(root.children().len(), 1);
    assert_eq!(root.children()[0].name, "arm");
    assert!(Arc::ptr_eq(&model.bones[1].parent().unwrap(), root));

    assert_eq!(model.meshes.len(), 1);
    let mesh = &model.meshes[0];
    assert_eq!(mesh.name, "hull");
    assert_eq!(mesh.parent_bone().unwrap().name, "root");
    assert_eq!(mesh.parts.len(), 2);

    let part = &mesh.parts[0];
    assert_eq!(part.topology, PrimitiveTopology::TriangleList);
    assert_eq!(part.vertex_count, 3);
    assert_eq!(part.primitive_count, 1);
    assert_eq!(part.index_buffer.format, IndexFormat::Uint16);
    assert_eq!(
        part.vertex_buffer.layout.elements[0].semantic,
        VertexSemantic::Position
    );

    // Both parts cited material id 1 and must share one instance.
    let m0 = part.material.as_ref().unwrap();
    let m1 = mesh.parts[1].material.as_ref().unwrap();
    assert!(Arc::ptr_eq(m0, m1));
    assert_eq!(m0.name, "steel");
    assert!(m0.texture.is_none());
}

fn scene_json() -> &'static str {
    r#"{
        "buffers": [{"byteLength": 46}],
        "bufferViews": {
            "geo": {"buffer": 0, "byteOffset": 0, "byteLength": 40},
            "idx": {"buffer": 0, "byteOffset": 40, "byteLength": 6}
        },
        "accessors": {
            "pos": {
                "bufferView": "geo",
                "componentType": "f32",
                "type": "vec3",
                "count": 2
            },
            "uv": {
                "bufferView": "geo",
                "byteOffset": 24,
                "componentType": "f32",
                "type": "vec2",
                "count": 2
            },
            "tri": {
                "bufferView": "idx",
                "componentType": "u16",
                "type": "scalar",
                "count": 3
            }
        },
        "materials": {
            "flat": {"diffuse": [0.5, 0.5, 0.5]}
        },
        "meshes": {
            "quad": {
                "primitives": [
                    {
                        "attributes": [
                            {"semantic": "position", "accessor": "pos"},
                            {"semantic": "texcoord", "accessor": "uv"}
                        ],
                        "indices": "tri",
                        "material": "flat"
                    },
                    {
                        "attributes": [
                            {"semantic": "position", "accessor": "pos"}
                        ],
                        "material": "flat",
                        "topology": "line-strip"
                    }
                ]
            }
        },
        "nodes": {
            "root": {
                "translation": [0.0, 1.0, 0.0],
                "children": ["limb"],
                "meshes": ["quad"]
            },
            "limb": {
                "translation": [1.0, 0.0, 0.0],
                "joint": true
            }
        },
        "scene": ["root"]
    }"#
}

fn scene_buffers() -> Vec<Vec<u8>> {
    let mut bytes = Vec::with_capacity(46);
    for v in [
        1.0f32, 2.0, 3.0, //
        4.0, 5.0, 6.0, //
        0.1, 0.2, //
        0.3, 0.4,
    ] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    for i in [0u16, 1, 0] {
        bytes.extend_from_slice(&i.to_le_bytes());
    }
    bytes.resize(46, 0);
    vec![bytes]
}

#[test]
fn test_json_scene_end_to_end() {
    init_logging();
    let registry = TypeReaderRegistry::standard();
    let mut session = LoadSession::from_json(&registry, scene_json(), scene_buffers()).unwrap();

    let scene = assembler::load_scene(&mut session).unwrap();
    assert_eq!(scene.roots.len(), 1);
    let root = &scene.roots[0];
    assert_eq!(root.children().len(), 1);
    let limb = &root.children()[0];
    assert!(limb.is_joint);
    assert!(Arc::ptr_eq(&limb.parent().unwrap(), root));

    let mesh = &root.meshes()[0];
    assert_eq!(mesh.parts.len(), 2);

    // Interleaved position + texcoord: stride 20, 40 bytes total,
    // vertex 1's texcoord at byte 32.
    let vb = &mesh.parts[0].vertex_buffer;
    assert_eq!(vb.layout.stride, 20);
    assert_eq!(vb.data.len(), 40);
    let u = f32::from_le_bytes([vb.data[32], vb.data[33], vb.data[34], vb.data[35]]);
    assert_eq!(u, 0.3);

    // Indexed part draws by index count, strip part by vertex count.
    assert_eq!(mesh.parts[0].primitive_count, 1);
    assert_eq!(mesh.parts[1].topology, PrimitiveTopology::LineStrip);
    assert_eq!(mesh.parts[1].primitive_count, 1);

    // Both parts resolved "flat" and share one material.
    let m0 = mesh.parts[0].material.as_ref().unwrap();
    let m1 = mesh.parts[1].material.as_ref().unwrap();
    assert!(Arc::ptr_eq(m0, m1));
}

#[test]
fn test_resolution_is_idempotent() {
    init_logging();
    let registry = TypeReaderRegistry::standard();
    let mut session = LoadSession::from_json(&registry, scene_json(), scene_buffers()).unwrap();

    let a = session
        .resolve(ContentKind::Accessor, ContentKey::Name("pos".into()))
        .unwrap()
        .into_accessor()
        .unwrap();
    let b = session
        .resolve(ContentKind::Accessor, ContentKey::Name("pos".into()))
        .unwrap()
        .into_accessor()
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    // The accessors share their buffer view through the cache too.
    assert!(Arc::ptr_eq(
        &a.view,
        &session
            .resolve(ContentKind::BufferView, ContentKey::Name("geo".into()))
            .unwrap()
            .into_buffer_view()
            .unwrap()
    ));
}

#[test]
fn test_unknown_reference_reports_kind_and_key() {
    init_logging();
    let registry = TypeReaderRegistry::standard();
    let mut session = LoadSession::from_json(&registry, scene_json(), scene_buffers()).unwrap();

    let err = session
        .resolve(ContentKind::Mesh, ContentKey::Name("ghost".into()))
        .unwrap_err();
    match err {
        ContentError::ReferenceNotFound { kind, key } => {
            assert_eq!(kind, ContentKind::Mesh);
            assert_eq!(key, ContentKey::Name("ghost".into()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_cyclic_nodes_load_without_leaking() {
    init_logging();
    let registry = TypeReaderRegistry::standard();
    let json = r#"{
        "nodes": {
            "a": {"children": ["b"]},
            "b": {"children": ["a"]}
        },
        "scene": ["a"]
    }"#;
    let weak;
    {
        let mut session = LoadSession::from_json(&registry, json, Vec::new()).unwrap();
        let scene = assembler::load_scene(&mut session).unwrap();
        let a = &scene.roots[0];
        assert_eq!(a.children().len(), 1);
        let b = &a.children()[0];
        assert_eq!(b.name, "b");
        // The edge back to "a" was dropped, so ownership is acyclic.
        assert!(b.children().is_empty());
        assert!(Arc::ptr_eq(&b.parent().unwrap(), a));
        weak = Arc::downgrade(a);
        drop(session);
        assert!(weak.upgrade().is_some());
    }
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_skeleton_assembly() {
    init_logging();
    let registry = TypeReaderRegistry::standard();
    let json = r#"{
        "buffers": [{"byteLength": 64}],
        "bufferViews": {"ibm": {"buffer": 0, "byteLength": 64}},
        "accessors": {
            "ibm_acc": {
                "bufferView": "ibm",
                "componentType": "f32",
                "type": "mat4",
                "count": 1
            }
        },
        "nodes": {
            "root": {
                "translation": [0.0, 1.0, 0.0],
                "children": ["limb"],
                "skin": "rig"
            },
            "limb": {
                "translation": [1.0, 0.0, 0.0],
                "joint": true
            }
        },
        "skins": {
            "rig": {
                "joints": ["limb"],
                "inverseBindMatrices": "ibm_acc"
            }
        },
        "scene": ["root"]
    }"#;

    let mut ibm_bytes = Vec::with_capacity(64);
    for i in 0..16 {
        ibm_bytes.extend_from_slice(&(i as f32).to_le_bytes());
    }
    let expected_ibm = {
        let values: Vec<f32> = (0..16).map(|i| i as f32).collect();
        Mat4::from_column_slice(&values)
    };

    let mut session = LoadSession::from_json(&registry, json, vec![ibm_bytes]).unwrap();
    let scene = assembler::load_scene(&mut session).unwrap();

    let root = &scene.roots[0];
    let skeleton = root.skin().unwrap();
    assert_eq!(skeleton.joint_count(), 1);
    assert_eq!(skeleton.joints[0].index, 0);
    assert_eq!(skeleton.joints[0].node.joint_index(), Some(0));
    assert_eq!(skeleton.inverse_bind_matrices[0], expected_ibm);

    // The world cache was seeded after parent wiring: the joint's
    // local-to-root carries both translations.
    let world = skeleton.world_transforms();
    assert_eq!(world[0][(0, 3)], 1.0);
    assert_eq!(world[0][(1, 3)], 1.0);

    // The joint node resolved through the skin is the scene-graph node.
    assert!(Arc::ptr_eq(&skeleton.joints[0].node, &root.children()[0]));
}

#[test]
fn test_unknown_semantic_defaults_to_color() {
    init_logging();
    let registry = TypeReaderRegistry::standard();
    let json = r#"{
        "buffers": [{"byteLength": 24}],
        "bufferViews": {"geo": {"buffer": 0, "byteLength": 24}},
        "accessors": {
            "odd": {
                "bufferView": "geo",
                "componentType": "f32",
                "type": "vec3",
                "count": 2
            }
        },
        "meshes": {
            "m": {
                "primitives": [{
                    "attributes": [{"semantic": "psize", "accessor": "odd"}]
                }]
            }
        }
    }"#;
    let mut session =
        LoadSession::from_json(&registry, json, vec![vec![0u8; 24]]).unwrap();
    let mesh = session
        .resolve(ContentKind::Mesh, ContentKey::Name("m".into()))
        .unwrap()
        .into_mesh()
        .unwrap();
    assert_eq!(
        mesh.parts[0].vertex_buffer.layout.elements[0].semantic,
        VertexSemantic::Color
    );
}

#[test]
fn test_node_rejects_matrix_and_trs() {
    init_logging();
    let registry = TypeReaderRegistry::standard();
    let json = r#"{
        "nodes": {
            "bad": {
                "matrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1],
                "translation": [1.0, 0.0, 0.0]
            }
        }
    }"#;
    let mut session = LoadSession::from_json(&registry, json, Vec::new()).unwrap();
    let err = session
        .resolve(ContentKind::Node, ContentKey::Name("bad".into()))
        .unwrap_err();
    // The resolver attaches the failing key to the reader's error.
    match err {
        ContentError::ReadFailed { kind, key, source } => {
            assert_eq!(kind, ContentKind::Node);
            assert_eq!(key, ContentKey::Name("bad".into()));
            assert!(matches!(*source, ContentError::InvalidFormat(_)));
        }
        other => panic!("unexpected error: {other}"),
    }

    // The failed read evicted its placeholder; resolving again fails
    // the same way instead of yielding a half-built node.
    assert!(session
        .resolve(ContentKind::Node, ContentKey::Name("bad".into()))
        .is_err());
}
