pub mod onnx_face_classifier;
